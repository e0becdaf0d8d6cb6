use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::keys;
use super::{Author, Publisher, Series, TocEntry};

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Empty text, zero, or `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Flag(value) => !value,
            FieldValue::Integer(value) => *value == 0,
            FieldValue::Real(value) => *value == 0.0,
            FieldValue::Text(value) => value.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// The content of one field, detached from its book.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Authors(Vec<Author>),
    Series(Vec<Series>),
    Publishers(Vec<Publisher>),
    Toc(Vec<TocEntry>),
    Value(FieldValue),
}

impl Field {
    pub fn is_blank(&self) -> bool {
        match self {
            Field::Authors(list) => list.is_empty(),
            Field::Series(list) => list.is_empty(),
            Field::Publishers(list) => list.is_empty(),
            Field::Toc(list) => list.is_empty(),
            Field::Value(value) => value.is_blank(),
        }
    }
}

/// A book record, complete or partial.
///
/// A partial record (a search result, a delta to commit) simply leaves out
/// the fields it does not carry. List fields live in typed slots; every
/// other field is a keyed scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Author>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<Series>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishers: Option<Vec<Publisher>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc: Option<Vec<TocEntry>>,

    #[serde(flatten)]
    pub values: BTreeMap<String, FieldValue>,
}

impl Book {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = Some(authors);
        self
    }

    pub fn with_series(mut self, series: Vec<Series>) -> Self {
        self.series = Some(series);
        self
    }

    pub fn with_publishers(mut self, publishers: Vec<Publisher>) -> Self {
        self.publishers = Some(publishers);
        self
    }

    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.toc = Some(toc);
        self
    }

    pub fn with_value(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set_value(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        match key {
            keys::AUTHORS => self.authors.is_some(),
            keys::SERIES => self.series.is_some(),
            keys::PUBLISHERS => self.publishers.is_some(),
            keys::TOC => self.toc.is_some(),
            _ => self.values.contains_key(key),
        }
    }

    /// Keys of all fields present, list fields first.
    pub fn keys(&self) -> Vec<String> {
        keys::LIST_KEYS
            .iter()
            .filter(|key| self.contains(key))
            .map(|key| key.to_string())
            .chain(self.values.keys().cloned())
            .collect()
    }

    /// Missing, empty, zero or `false`.
    pub fn is_blank(&self, key: &str) -> bool {
        match key {
            keys::AUTHORS => self.authors.as_ref().is_none_or(Vec::is_empty),
            keys::SERIES => self.series.as_ref().is_none_or(Vec::is_empty),
            keys::PUBLISHERS => self.publishers.as_ref().is_none_or(Vec::is_empty),
            keys::TOC => self.toc.as_ref().is_none_or(Vec::is_empty),
            _ => self.values.get(key).is_none_or(FieldValue::is_blank),
        }
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(FieldValue::as_text)
    }

    /// Sets a scalar field. List keys are ignored; use the typed slots.
    pub fn set_value(&mut self, key: &str, value: impl Into<FieldValue>) {
        if keys::is_list_key(key) {
            return;
        }
        self.values.insert(key.to_string(), value.into());
    }

    /// Removes a field and hands back its content.
    pub fn take(&mut self, key: &str) -> Option<Field> {
        match key {
            keys::AUTHORS => self.authors.take().map(Field::Authors),
            keys::SERIES => self.series.take().map(Field::Series),
            keys::PUBLISHERS => self.publishers.take().map(Field::Publishers),
            keys::TOC => self.toc.take().map(Field::Toc),
            _ => self.values.remove(key).map(Field::Value),
        }
    }

    /// Stores a field under `key`. List content always lands in its own slot.
    pub fn put(&mut self, key: &str, field: Field) {
        match field {
            Field::Authors(list) => self.authors = Some(list),
            Field::Series(list) => self.series = Some(list),
            Field::Publishers(list) => self.publishers = Some(list),
            Field::Toc(list) => self.toc = Some(list),
            Field::Value(value) => self.set_value(key, value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}
