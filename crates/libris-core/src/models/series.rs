use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::merge::{Mergeable, overwrite_text, overwrite_value};
use crate::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub id: i64,

    pub title: String,

    /// Free-form position in the series: "3", "2.50", "IV", or empty.
    #[serde(default)]
    pub number: String,

    #[serde(default)]
    pub complete: bool,
}

impl Series {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            number: String::new(),
            complete: false,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn key(&self, locale: &Locale) -> String {
        normalize(&self.title, locale)
    }

    /// "Title (3)" or just the title.
    pub fn label(&self) -> String {
        let number = self.number.trim();
        if number.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({number})", self.title)
        }
    }
}

impl Mergeable for Series {
    const KIND: &'static str = "series";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn is_same(&self, other: &Self, locale: &Locale) -> bool {
        self.key(locale) == other.key(locale)
    }

    fn merge_from(&mut self, other: &Self, _locale: &Locale) -> bool {
        let mut changed = overwrite_text(&mut self.title, &other.title);
        let number = other.number.trim();
        if !number.is_empty() && self.number != number {
            self.number = number.to_string();
            changed = true;
        }
        changed |= overwrite_value(&mut self.complete, other.complete);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_copied_when_missing() {
        let en = Locale::default();
        let mut first = Series::new("Foundation");
        let second = Series::new("foundation").with_number("2.50");
        assert!(first.is_same(&second, &en));
        assert!(first.merge_from(&second, &en));
        assert_eq!(first.number, "2.50");
        assert_eq!(first.title, "foundation");
    }

    #[test]
    fn blank_number_never_erases() {
        let en = Locale::default();
        let mut first = Series::new("Discworld").with_number("7");
        assert!(!first.merge_from(&Series::new("Discworld"), &en));
        assert_eq!(first.number, "7");
        assert_eq!(first.label(), "Discworld (7)");
    }

    #[test]
    fn conflicting_numbers_last_wins() {
        let en = Locale::default();
        let mut first = Series::new("Dune").with_number("1");
        first.merge_from(&Series::new("Dune").with_number("2"), &en);
        assert_eq!(first.number, "2");
    }
}
