//! Persistence contract consumed by the merge engine, plus a SQLite
//! implementation of it.

pub mod database;
pub mod repositories;

pub use database::{ConnectionPool, Database};

use crate::error::Result;
use crate::locale::Locale;
use crate::merge::Mergeable;
use crate::models::Book;
use crate::prune::prune_with_lookup;

/// Storage of one entity type, addressed by normalized name.
pub trait EntityStore<T: Mergeable> {
    /// Id of the stored row matching `entity` by name, or 0.
    fn find_id(&self, entity: &T, locale: &Locale) -> Result<i64>;

    fn exists(&self, id: i64) -> Result<bool>;

    /// Persists a new row and returns its id. The entity is not modified.
    fn insert(&self, entity: &T, locale: &Locale) -> Result<i64>;

    /// Resolves `entity.id` from storage when it is 0.
    ///
    /// Outside batch mode a non-zero id that no longer exists is treated as
    /// stale and resolved again by name.
    fn fix_id(&self, entity: &mut T, batch_mode: bool, locale: &Locale) -> Result<()> {
        let id = entity.id();
        if id != 0 && (batch_mode || self.exists(id)?) {
            return Ok(());
        }
        let found = self.find_id(entity, locale)?;
        entity.set_id(found);
        Ok(())
    }

    /// De-duplicates `list`, resolving unknown ids first unless in batch mode.
    fn prune_list(&self, list: &mut Vec<T>, batch_mode: bool, locale: &Locale) -> Result<bool> {
        prune_with_lookup(list, locale, batch_mode, |entity, locale| {
            self.find_id(entity, locale)
        })
    }
}

/// Storage of whole books.
pub trait BookStore {
    fn get_book(&self, id: i64) -> Result<Book>;

    fn insert_book(&self, book: &Book, locale: &Locale) -> Result<i64>;

    /// Applies a delta record: every field present replaces the stored one.
    fn update_book(&self, delta: &Book, locale: &Locale) -> Result<()>;
}
