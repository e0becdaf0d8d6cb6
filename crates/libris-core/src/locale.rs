use std::fmt;

use serde::{Deserialize, Serialize};

/// A BCP-47 style language tag, e.g. `en`, `en-GB`, `tr-TR`.
///
/// Only the primary language subtag influences comparison; the rest is kept
/// so the tag round-trips through configuration untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into().trim().replace('_', "-");
        Self { tag }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Lowercased primary language subtag (`"en"` for `"en-GB"`).
    pub fn language(&self) -> String {
        self.tag
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Turkic languages distinguish dotted and dotless I.
    fn has_dotted_i(&self) -> bool {
        matches!(self.language().as_str(), "tr" | "az")
    }

    /// Locale-sensitive lowercase mapping.
    pub fn to_lowercase(&self, text: &str) -> String {
        if !self.has_dotted_i() {
            return text.to_lowercase();
        }

        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                'I' => out.push('ı'),
                'İ' => out.push('i'),
                other => out.extend(other.to_lowercase()),
            }
        }
        out
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
