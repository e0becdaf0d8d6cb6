use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// How an incoming field value is merged into an existing book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Skip,
    CopyIfBlank,
    /// Only meaningful for append-capable fields.
    Append,
    Overwrite,
}

impl SyncAction {
    pub const ALL: [SyncAction; 4] = [
        SyncAction::Skip,
        SyncAction::CopyIfBlank,
        SyncAction::Append,
        SyncAction::Overwrite,
    ];

    /// The action that follows `self` when cycling through the choices.
    pub fn next_state(self, can_append: bool) -> Self {
        match self {
            SyncAction::Skip => SyncAction::CopyIfBlank,
            SyncAction::CopyIfBlank if can_append => SyncAction::Append,
            SyncAction::CopyIfBlank => SyncAction::Overwrite,
            SyncAction::Append => SyncAction::Overwrite,
            SyncAction::Overwrite => SyncAction::Skip,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::Skip => "skip",
            SyncAction::CopyIfBlank => "copy_if_blank",
            SyncAction::Append => "append",
            SyncAction::Overwrite => "overwrite",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SyncAction::Skip => "Skip",
            SyncAction::CopyIfBlank => "Copy if blank",
            SyncAction::Append => "Append",
            SyncAction::Overwrite => "Overwrite",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        SyncAction::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| SyncError::UnknownAction(s.to_string()))
    }
}
