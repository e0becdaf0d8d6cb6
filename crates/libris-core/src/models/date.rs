use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LibrisError;

/// A date of which only the year is guaranteed: `1978`, `1978-05`, `1978-05-12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartialDate {
    year: i32,
    month: Option<u32>,
    day: Option<u32>,
}

impl PartialDate {
    pub fn from_year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn new(year: i32, month: Option<u32>, day: Option<u32>) -> Option<Self> {
        match (month, day) {
            (None, None) => Some(Self::from_year(year)),
            (Some(m), None) => NaiveDate::from_ymd_opt(year, m, 1).map(|_| Self {
                year,
                month: Some(m),
                day: None,
            }),
            (Some(m), Some(d)) => NaiveDate::from_ymd_opt(year, m, d).map(|_| Self {
                year,
                month: Some(m),
                day: Some(d),
            }),
            (None, Some(_)) => None,
        }
    }

    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('-');
        let year_part = parts.next()?;
        if year_part.len() != 4 {
            return None;
        }
        let year: i32 = year_part.parse().ok()?;
        let month = match parts.next() {
            Some(m) => Some(m.parse::<u32>().ok()?),
            None => None,
        };
        let day = match parts.next() {
            Some(d) => Some(d.parse::<u32>().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Self::new(year, month, day)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
            if let Some(day) = self.day {
                write!(f, "-{day:02}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PartialDate {
    type Err = LibrisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| LibrisError::ValidationError(format!("invalid date: {s}")))
    }
}

impl Serialize for PartialDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lenient deserializer for optional dates coming from external sources:
/// an unparseable value is dropped instead of failing the whole record.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<PartialDate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Year(i64),
        Other(serde::de::IgnoredAny),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Text(text)) => PartialDate::parse(&text),
        Some(Raw::Year(year)) => i32::try_from(year).ok().map(PartialDate::from_year),
        Some(Raw::Other(_)) | None => None,
    })
}
