mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, get_applied_versions};
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use crate::error::Result;
use crate::locale::Locale;
use crate::models::{Author, Book, Publisher, Series, TocEntry};

use super::repositories::{
    Repository, SqliteAuthorRepository, SqliteBookRepository, SqlitePublisherRepository,
    SqliteSeriesRepository, SqliteTocRepository,
};
use super::{BookStore, EntityStore};

pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pool = ConnectionPool::open(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn applied_migrations(&self) -> Result<Vec<u32>> {
        let conn = self.pool.get_connection();
        get_applied_versions(&conn)
    }
}

impl EntityStore<Author> for Database {
    fn find_id(&self, entity: &Author, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).find_id(entity, locale)
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).exists(id)
    }

    fn insert(&self, entity: &Author, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteAuthorRepository::new(&conn).insert(entity, locale)
    }
}

impl EntityStore<Series> for Database {
    fn find_id(&self, entity: &Series, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteSeriesRepository::new(&conn).find_id(entity, locale)
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get_connection();
        SqliteSeriesRepository::new(&conn).exists(id)
    }

    fn insert(&self, entity: &Series, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteSeriesRepository::new(&conn).insert(entity, locale)
    }
}

impl EntityStore<Publisher> for Database {
    fn find_id(&self, entity: &Publisher, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqlitePublisherRepository::new(&conn).find_id(entity, locale)
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get_connection();
        SqlitePublisherRepository::new(&conn).exists(id)
    }

    fn insert(&self, entity: &Publisher, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqlitePublisherRepository::new(&conn).insert(entity, locale)
    }
}

impl EntityStore<TocEntry> for Database {
    fn find_id(&self, entity: &TocEntry, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteTocRepository::new(&conn).find_id(entity, locale)
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get_connection();
        SqliteTocRepository::new(&conn).exists(id)
    }

    fn insert(&self, entity: &TocEntry, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteTocRepository::new(&conn).insert(entity, locale)
    }
}

impl BookStore for Database {
    fn get_book(&self, id: i64) -> Result<Book> {
        let conn = self.pool.get_connection();
        SqliteBookRepository::new(&conn).get(id)
    }

    fn insert_book(&self, book: &Book, locale: &Locale) -> Result<i64> {
        let conn = self.pool.get_connection();
        SqliteBookRepository::new(&conn).insert(book, locale)
    }

    fn update_book(&self, delta: &Book, locale: &Locale) -> Result<()> {
        let conn = self.pool.get_connection();
        SqliteBookRepository::new(&conn).apply_delta(delta, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibrisError;
    use crate::models::{AuthorType, PartialDate, keys};

    fn en() -> Locale {
        Locale::default()
    }

    #[test]
    fn migrations_are_recorded() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.applied_migrations().unwrap(), vec![SCHEMA_VERSION]);
    }

    #[test]
    fn fix_id_resolves_by_normalized_name() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&Author::new("Brontë", "Charlotte"), &en()).unwrap();

        let mut author = Author::new("BRONTE", "charlotte");
        db.fix_id(&mut author, false, &en()).unwrap();
        assert_eq!(author.id, id);

        let mut unknown = Author::new("Austen", "Jane");
        db.fix_id(&mut unknown, false, &en()).unwrap();
        assert_eq!(unknown.id, 0);
    }

    #[test]
    fn fix_id_replaces_stale_ids_outside_batch_mode() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&Publisher::new("Tor"), &en()).unwrap();

        let mut stale = Publisher::new("Tor").with_id(9999);
        db.fix_id(&mut stale, true, &en()).unwrap();
        assert_eq!(stale.id, 9999);

        db.fix_id(&mut stale, false, &en()).unwrap();
        assert_eq!(stale.id, id);
    }

    #[test]
    fn prune_list_resolves_then_merges() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert(&Series::new("Foundation"), &en()).unwrap();

        let mut list = vec![Series::new("foundation"), Series::new("Robots")];
        let modified = db.prune_list(&mut list, false, &en()).unwrap();
        assert!(!modified);
        assert_eq!(list[0].id, id);
        assert_eq!(list[1].id, 0);

        let mut batch = vec![Series::new("foundation")];
        db.prune_list(&mut batch, true, &en()).unwrap();
        assert_eq!(batch[0].id, 0);
    }

    #[test]
    fn book_round_trip_with_lists() {
        let db = Database::open_in_memory().unwrap();
        let asimov = Author::new("Asimov", "Isaac").with_type(AuthorType::WRITER);
        let book = Book::new(0)
            .with_value(keys::TITLE, "The Complete Stories")
            .with_authors(vec![
                asimov.clone(),
                Author::new("French", "Paul").with_real_author(&asimov),
            ])
            .with_series(vec![Series::new("Robots").with_number("2.50")])
            .with_publishers(vec![Publisher::new("Doubleday")])
            .with_toc(vec![
                TocEntry::new(asimov.clone(), "Robbie")
                    .with_first_publication(PartialDate::parse("1940-09").unwrap()),
            ]);

        let id = db.insert_book(&book, &en()).unwrap();
        let stored = db.get_book(id).unwrap();

        assert_eq!(stored.text(keys::TITLE), Some("The Complete Stories"));
        let authors = stored.authors.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].author_type, AuthorType::WRITER);
        let real = authors[1].real_author.as_ref().unwrap();
        assert_eq!(real.id, authors[0].id);
        assert_eq!(stored.series.unwrap()[0].number, "2.50");
        assert_eq!(stored.publishers.unwrap()[0].name, "Doubleday");
        let toc = stored.toc.unwrap();
        assert_eq!(toc[0].primary_author.id, authors[0].id);
        assert_eq!(toc[0].first_publication_year(), Some(1940));
    }

    #[test]
    fn update_book_replaces_only_delta_fields() {
        let db = Database::open_in_memory().unwrap();
        let book = Book::new(0)
            .with_value(keys::TITLE, "Dune")
            .with_value(keys::LANGUAGE, "en")
            .with_authors(vec![Author::new("Herbert", "Frank")]);
        let id = db.insert_book(&book, &en()).unwrap();

        let delta = Book::new(id)
            .with_value(keys::PAGES, 412)
            .with_publishers(vec![Publisher::new("Chilton")]);
        db.update_book(&delta, &en()).unwrap();

        let stored = db.get_book(id).unwrap();
        assert_eq!(stored.text(keys::TITLE), Some("Dune"));
        assert_eq!(stored.text(keys::LANGUAGE), Some("en"));
        assert_eq!(stored.value(keys::PAGES), Some(&crate::models::FieldValue::Integer(412)));
        assert_eq!(stored.authors.unwrap().len(), 1);
        assert_eq!(stored.publishers.unwrap()[0].name, "Chilton");
    }

    #[test]
    fn toc_update_leaves_author_rows_alone() {
        let db = Database::open_in_memory().unwrap();
        let asimov = Author::new("Asimov", "Isaac");
        let mut french = Author::new("French", "Paul").with_real_author(&asimov);
        french.complete = true;
        let id = db
            .insert_book(&Book::new(0).with_authors(vec![french]), &en())
            .unwrap();

        let delta = Book::new(id).with_toc(vec![TocEntry::new(
            Author::new("French", "Paul"),
            "Lucky Starr and the Pirates of the Asteroids",
        )]);
        db.update_book(&delta, &en()).unwrap();

        let stored = db.get_book(id).unwrap();
        let authors = stored.authors.unwrap();
        assert_eq!(authors.len(), 1);
        assert!(authors[0].complete);
        assert_eq!(authors[0].real_author.as_ref().unwrap().family_name, "Asimov");
        let toc = stored.toc.unwrap();
        assert_eq!(toc[0].primary_author.id, authors[0].id);
        assert!(toc[0].primary_author.real_author.is_some());
    }

    #[test]
    fn author_list_without_real_author_keeps_stored_link() {
        let db = Database::open_in_memory().unwrap();
        let asimov = Author::new("Asimov", "Isaac");
        let id = db
            .insert_book(
                &Book::new(0).with_authors(vec![Author::new("French", "Paul").with_real_author(&asimov)]),
                &en(),
            )
            .unwrap();

        let delta = Book::new(id).with_authors(vec![Author::new("FRENCH", "paul")]);
        db.update_book(&delta, &en()).unwrap();

        let authors = db.get_book(id).unwrap().authors.unwrap();
        assert_eq!(authors[0].real_author.as_ref().unwrap().family_name, "Asimov");
    }

    #[test]
    fn update_unknown_book_fails() {
        let db = Database::open_in_memory().unwrap();
        let err = db.update_book(&Book::new(77), &en()).unwrap_err();
        assert!(matches!(err, LibrisError::BookNotFound(77)));
    }
}
