use tracing::debug;

use crate::locale::Locale;
use crate::normalize::keeps_resident_spelling;

/// What "equal" means for an entity type and how two equal instances combine.
pub trait Mergeable {
    /// Short entity name used in log output.
    const KIND: &'static str;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Whether `other` is the same logical entity. Never looks at ids.
    fn is_same(&self, other: &Self, locale: &Locale) -> bool;

    /// Folds the non-id data of a later duplicate into `self`.
    ///
    /// Returns `true` when any field of `self` changed.
    fn merge_from(&mut self, other: &Self, locale: &Locale) -> bool;
}

/// Id of the survivor after merging a duplicate into it.
///
/// A single known id wins over an unknown one; two different known ids cancel
/// each other out.
pub fn reconcile_id(survivor: i64, duplicate: i64) -> i64 {
    match (survivor, duplicate) {
        (0, other) => other,
        (own, 0) => own,
        (own, other) if own == other => own,
        (own, other) => {
            debug!(survivor = own, duplicate = other, "id conflict, resetting to 0");
            0
        }
    }
}

/// Last-write-wins for display text; blank incoming text never erases, and a
/// plain spelling never replaces the accented form already in place.
pub(crate) fn overwrite_text(target: &mut String, incoming: &str) -> bool {
    if incoming.trim().is_empty() || target == incoming || keeps_resident_spelling(target, incoming)
    {
        return false;
    }
    *target = incoming.to_string();
    true
}

/// Last-write-wins for optional attributes; `None` never erases.
pub(crate) fn overwrite_option<T: Clone + PartialEq>(
    target: &mut Option<T>,
    incoming: &Option<T>,
) -> bool {
    match incoming {
        Some(value) if target.as_ref() != Some(value) => {
            *target = Some(value.clone());
            true
        }
        _ => false,
    }
}

pub(crate) fn overwrite_value<T: Copy + PartialEq>(target: &mut T, incoming: T) -> bool {
    if *target == incoming {
        return false;
    }
    *target = incoming;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_adopts_single_known_id() {
        assert_eq!(reconcile_id(0, 7), 7);
        assert_eq!(reconcile_id(7, 0), 7);
        assert_eq!(reconcile_id(7, 7), 7);
        assert_eq!(reconcile_id(0, 0), 0);
    }

    #[test]
    fn reconcile_resets_conflicting_ids() {
        assert_eq!(reconcile_id(5, 9), 0);
    }

    #[test]
    fn overwrite_text_rules() {
        let mut text = "Bronte".to_string();
        assert!(!overwrite_text(&mut text, "  "));
        assert!(overwrite_text(&mut text, "Brontë"));
        assert_eq!(text, "Brontë");
        assert!(!overwrite_text(&mut text, "Bronte"));
        assert_eq!(text, "Brontë");
        assert!(overwrite_text(&mut text, "BRONTË"));
        assert_eq!(text, "BRONTË");
    }

    #[test]
    fn overwrite_option_never_erases() {
        let mut value = Some(3);
        assert!(!overwrite_option(&mut value, &None));
        assert!(overwrite_option(&mut value, &Some(4)));
        assert_eq!(value, Some(4));
    }
}
