use serde::{Deserialize, Serialize};

use super::author::Author;
use super::date::{PartialDate, deserialize_lenient};
use crate::locale::Locale;
use crate::merge::{Mergeable, overwrite_option, overwrite_text, reconcile_id};
use crate::normalize::normalize;

/// A single work in an anthology or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    #[serde(default)]
    pub id: i64,

    pub title: String,

    pub primary_author: Author,

    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_publication: Option<PartialDate>,

    /// Book the entry was first published in, 0 when standalone.
    #[serde(default)]
    pub book_id: i64,
}

impl TocEntry {
    pub fn new(primary_author: Author, title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            primary_author,
            first_publication: None,
            book_id: 0,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_first_publication(mut self, date: PartialDate) -> Self {
        self.first_publication = Some(date);
        self
    }

    /// Sets the first publication date from raw text; unparseable text leaves
    /// the entry without a date.
    pub fn with_first_publication_text(mut self, raw: &str) -> Self {
        self.first_publication = PartialDate::parse(raw);
        self
    }

    pub fn key(&self, locale: &Locale) -> String {
        normalize(&self.title, locale)
    }

    pub fn first_publication_year(&self) -> Option<i32> {
        self.first_publication.map(|d| d.year())
    }
}

impl Mergeable for TocEntry {
    const KIND: &'static str = "toc entry";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn is_same(&self, other: &Self, locale: &Locale) -> bool {
        if self.key(locale) != other.key(locale) {
            return false;
        }
        // Same title, different known years: two different works.
        if let (Some(a), Some(b)) = (self.first_publication_year(), other.first_publication_year())
            && a != b
        {
            return false;
        }
        self.primary_author.is_same_person(&other.primary_author, locale)
    }

    fn merge_from(&mut self, other: &Self, locale: &Locale) -> bool {
        let mut changed = overwrite_text(&mut self.title, &other.title);
        changed |= overwrite_option(&mut self.first_publication, &other.first_publication);

        let author_id = reconcile_id(self.primary_author.id, other.primary_author.id);
        if author_id != self.primary_author.id {
            self.primary_author.id = author_id;
            changed = true;
        }
        changed |= self.primary_author.merge_from(&other.primary_author, locale);

        if other.book_id != 0 && self.book_id != other.book_id {
            self.book_id = other.book_id;
            changed = true;
        }
        changed
    }
}
