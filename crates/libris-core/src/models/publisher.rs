use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::merge::{Mergeable, overwrite_text};
use crate::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn key(&self, locale: &Locale) -> String {
        normalize(&self.name, locale)
    }
}

impl Mergeable for Publisher {
    const KIND: &'static str = "publisher";

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
        overwrite_text(&mut self.name, &other.name)
    }
}
