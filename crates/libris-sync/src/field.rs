use serde::{Deserialize, Serialize};

use crate::action::SyncAction;

/// How a field's value is stored and therefore how it merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain scalar, replaced wholesale.
    Value,
    /// Scalar text that can be appended to.
    Text,
    /// Entity list, appended then pruned.
    List,
    /// Cover image slot, the value is a temp file path.
    Cover { index: usize },
}

/// One registered field and its current sync action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    default_action: SyncAction,
    action: SyncAction,
    /// Keys that travel together with this one, e.g. a price and its currency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl SyncField {
    pub fn new(
        label: impl Into<String>,
        key: impl Into<String>,
        kind: FieldKind,
        default_action: SyncAction,
    ) -> Self {
        let mut field = Self {
            key: key.into(),
            label: label.into(),
            kind,
            default_action: SyncAction::Skip,
            action: SyncAction::Skip,
            related: Vec::new(),
        };
        let action = field.clamp(default_action);
        field.default_action = action;
        field.action = action;
        field
    }

    pub fn can_append(&self) -> bool {
        matches!(self.kind, FieldKind::Text | FieldKind::List)
    }

    pub fn is_cover(&self) -> bool {
        matches!(self.kind, FieldKind::Cover { .. })
    }

    pub fn action(&self) -> SyncAction {
        self.action
    }

    pub fn default_action(&self) -> SyncAction {
        self.default_action
    }

    /// Sets the action; `Append` falls back to `CopyIfBlank` where it is
    /// not supported.
    pub fn set_action(&mut self, action: SyncAction) {
        self.action = self.clamp(action);
    }

    pub fn reset(&mut self) {
        self.action = self.default_action;
    }

    pub fn cycle(&mut self) {
        self.action = self.action.next_state(self.can_append());
    }

    /// Copy of this field registered under another key.
    pub(crate) fn related_as(&self, key: &str) -> Self {
        Self {
            key: key.to_string(),
            related: Vec::new(),
            ..self.clone()
        }
    }

    fn clamp(&self, action: SyncAction) -> SyncAction {
        if action == SyncAction::Append && !self.can_append() {
            SyncAction::CopyIfBlank
        } else {
            action
        }
    }
}
