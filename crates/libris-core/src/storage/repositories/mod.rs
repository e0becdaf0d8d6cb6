mod author_repository;
mod book_repository;
mod publisher_repository;
mod series_repository;
mod toc_repository;

pub use author_repository::SqliteAuthorRepository;
pub use book_repository::SqliteBookRepository;
pub use publisher_repository::SqlitePublisherRepository;
pub use series_repository::SqliteSeriesRepository;
pub use toc_repository::SqliteTocRepository;

use crate::error::Result;
use crate::locale::Locale;

/// Row-level access to one entity table.
pub trait Repository {
    type Entity;

    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Id of the row whose normalized name matches `entity`, or 0.
    fn find_id(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64>;

    fn insert(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64>;

    /// Rewrites the row `id` with the content of `entity`.
    fn update(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<()>;

    fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    /// `id` when it names a stored row, else the id found by name, else 0.
    fn resolve_id(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<i64> {
        if id != 0 && self.exists(id)? {
            return Ok(id);
        }
        self.find_id(entity, locale)
    }

    /// Row for `entity`, inserted when unknown. A stored row is left as is.
    fn find_or_insert(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<i64> {
        match self.resolve_id(entity, id, locale)? {
            0 => self.insert(entity, locale),
            id => Ok(id),
        }
    }

    /// Resolves the row for `entity`, inserting it when unknown, and keeps
    /// the stored row in line with the entity's current content.
    fn upsert(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<i64> {
        match self.resolve_id(entity, id, locale)? {
            0 => self.insert(entity, locale),
            id => {
                self.update(entity, id, locale)?;
                Ok(id)
            }
        }
    }
}
