//! In-place de-duplication of entity lists.
//!
//! The first occurrence of every duplicate group keeps its position; later
//! occurrences are folded into it and removed. The surviving spelling is
//! therefore decided by input order.

use tracing::debug;

use crate::error::Result;
use crate::locale::Locale;
use crate::merge::{Mergeable, reconcile_id};

/// Collapses duplicates in `list`.
///
/// Returns `true` when an element was removed or a survivor's content changed.
pub fn prune<T: Mergeable>(list: &mut Vec<T>, locale: &Locale) -> bool {
    let mut modified = false;

    let mut i = 0;
    while i < list.len() {
        let mut j = i + 1;
        while j < list.len() {
            if !list[i].is_same(&list[j], locale) {
                j += 1;
                continue;
            }

            // j now points at the next unvisited element.
            let duplicate = list.remove(j);
            let survivor = &mut list[i];

            let id = reconcile_id(survivor.id(), duplicate.id());
            survivor.set_id(id);
            survivor.merge_from(&duplicate, locale);
            modified = true;

            debug!(kind = T::KIND, position = i, id, "merged duplicate");
        }
        i += 1;
    }

    modified
}

/// Resolves unknown ids through `lookup`, then prunes.
///
/// In batch mode the lookup is skipped: the caller has already given the
/// first occurrence of each entity its best-effort id. Writing a resolved id
/// does not by itself count as a modification.
pub fn prune_with_lookup<T, F>(
    list: &mut Vec<T>,
    locale: &Locale,
    batch_mode: bool,
    mut lookup: F,
) -> Result<bool>
where
    T: Mergeable,
    F: FnMut(&T, &Locale) -> Result<i64>,
{
    if !batch_mode {
        for entity in list.iter_mut() {
            if entity.id() == 0 {
                let id = lookup(entity, locale)?;
                if id != 0 {
                    entity.set_id(id);
                }
            }
        }
    }

    Ok(prune(list, locale))
}
