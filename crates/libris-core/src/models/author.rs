use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::locale::Locale;
use crate::merge::{Mergeable, overwrite_option, overwrite_text, overwrite_value};
use crate::normalize::{author_key, split_author_name};

bitflags! {
    /// Roles an author played on a book. Several may apply at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AuthorType: u32 {
        const UNKNOWN = 0;
        const WRITER = 1;
        const TRANSLATOR = 1 << 1;
        const INTRODUCTION = 1 << 2;
        const EDITOR = 1 << 3;
        const CONTRIBUTOR = 1 << 4;
        const COVER_ARTIST = 1 << 5;
        const COVER_INKING = 1 << 6;
        const COVER_COLORIST = 1 << 7;
        const ARTIST = 1 << 8;
        const INKING = 1 << 9;
        const COLORIST = 1 << 10;
        const STORYBOARD = 1 << 11;
        const LETTERING = 1 << 12;
        const NARRATOR = 1 << 13;
        const FOREWORD = 1 << 14;
        const AFTERWORD = 1 << 15;
    }
}

impl Default for AuthorType {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

// Stored as the raw integer so the database column and JSON agree.
impl Serialize for AuthorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AuthorType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid AuthorType bits: {bits:#x}"))
        })
    }
}

/// Non-owning handle to the real identity behind a pen name.
///
/// Carries no further real author of its own, so a chain is at most one
/// level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealAuthor {
    #[serde(default)]
    pub id: i64,
    pub family_name: String,
    #[serde(default)]
    pub given_names: String,
}

impl RealAuthor {
    pub fn of(author: &Author) -> Self {
        Self {
            id: author.id,
            family_name: author.family_name.clone(),
            given_names: author.given_names.clone(),
        }
    }

    pub fn to_author(&self) -> Author {
        let mut author = Author::new(&self.family_name, &self.given_names);
        author.id = self.id;
        author
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: i64,

    pub family_name: String,

    #[serde(default)]
    pub given_names: String,

    #[serde(default, rename = "type")]
    pub author_type: AuthorType,

    #[serde(default)]
    pub complete: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_author: Option<RealAuthor>,
}

impl Author {
    pub fn new(family_name: impl Into<String>, given_names: impl Into<String>) -> Self {
        Self {
            id: 0,
            family_name: family_name.into(),
            given_names: given_names.into(),
            author_type: AuthorType::UNKNOWN,
            complete: false,
            real_author: None,
        }
    }

    /// Builds an author from a display name in either name order.
    pub fn from_name(name: &str) -> Self {
        let (family, given) = split_author_name(name);
        Self::new(family, given)
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_type(mut self, author_type: AuthorType) -> Self {
        self.author_type = author_type;
        self
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    pub fn with_real_author(mut self, real: &Author) -> Self {
        self.real_author = Some(RealAuthor::of(real));
        self
    }

    pub fn key(&self, locale: &Locale) -> String {
        author_key(&self.family_name, &self.given_names, locale)
    }

    /// "Given Family", or just the family name.
    pub fn formatted_name(&self) -> String {
        if self.given_names.trim().is_empty() {
            self.family_name.clone()
        } else {
            format!("{} {}", self.given_names, self.family_name)
        }
    }

    /// "Family, Given", as used for sorting.
    pub fn sort_name(&self) -> String {
        if self.given_names.trim().is_empty() {
            self.family_name.clone()
        } else {
            format!("{}, {}", self.family_name, self.given_names)
        }
    }

    /// Identity check used where a persisted id is more reliable than a name.
    pub fn is_same_person(&self, other: &Author, locale: &Locale) -> bool {
        if self.id != 0 && other.id != 0 {
            return self.id == other.id;
        }
        self.is_same(other, locale)
    }

    pub fn is_pen_name(&self) -> bool {
        self.real_author.is_some()
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted_name())
    }
}

impl Mergeable for Author {
    const KIND: &'static str = "author";

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
        let mut changed = overwrite_text(&mut self.family_name, &other.family_name);
        changed |= overwrite_text(&mut self.given_names, &other.given_names);

        let union = self.author_type | other.author_type;
        changed |= overwrite_value(&mut self.author_type, union);
        changed |= overwrite_value(&mut self.complete, other.complete);
        changed |= overwrite_option(&mut self.real_author, &other.real_author);
        changed
    }
}
