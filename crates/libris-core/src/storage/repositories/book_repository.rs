use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::{LibrisError, Result};
use crate::locale::Locale;
use crate::models::{Author, AuthorType, Book, FieldValue, Publisher, Series, TocEntry};

use super::{
    Repository, SqliteAuthorRepository, SqlitePublisherRepository, SqliteSeriesRepository,
    SqliteTocRepository,
};

pub struct SqliteBookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM books WHERE id = ?1")?
            .exists(params![id])?;
        Ok(exists)
    }

    pub fn get(&self, id: i64) -> Result<Book> {
        if !self.exists(id)? {
            return Err(LibrisError::BookNotFound(id));
        }

        let mut book = Book::new(id);
        book.values = self.read_fields(id)?;
        book.authors = Some(self.read_authors(id)?);
        book.series = Some(self.read_series(id)?);
        book.publishers = Some(self.read_publishers(id)?);
        book.toc = Some(self.read_toc(id)?);
        Ok(book)
    }

    /// Inserts `book` as a new row, ignoring its id.
    pub fn insert(&self, book: &Book, locale: &Locale) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO books (fields, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![serde_json::to_string(&book.values)?, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.write_lists(id, book, locale)?;
        tx.commit()?;
        Ok(id)
    }

    /// Applies a delta record in one transaction.
    pub fn apply_delta(&self, delta: &Book, locale: &Locale) -> Result<()> {
        if !self.exists(delta.id)? {
            return Err(LibrisError::BookNotFound(delta.id));
        }

        let tx = self.conn.unchecked_transaction()?;
        if !delta.values.is_empty() {
            let mut fields = self.read_fields(delta.id)?;
            fields.extend(delta.values.iter().map(|(k, v)| (k.clone(), v.clone())));
            self.conn.execute(
                "UPDATE books SET fields = ?2 WHERE id = ?1",
                params![delta.id, serde_json::to_string(&fields)?],
            )?;
        }
        self.write_lists(delta.id, delta, locale)?;
        self.conn.execute(
            "UPDATE books SET updated_at = ?2 WHERE id = ?1",
            params![delta.id, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn read_fields(&self, id: i64) -> Result<BTreeMap<String, FieldValue>> {
        let json: String =
            self.conn
                .query_row("SELECT fields FROM books WHERE id = ?1", params![id], |row| row.get(0))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Replaces the links of every list field present in `book`.
    fn write_lists(&self, book_id: i64, book: &Book, locale: &Locale) -> Result<()> {
        if let Some(authors) = &book.authors {
            self.write_authors(book_id, authors, locale)?;
        }
        if let Some(series) = &book.series {
            self.write_series(book_id, series, locale)?;
        }
        if let Some(publishers) = &book.publishers {
            self.write_publishers(book_id, publishers, locale)?;
        }
        if let Some(toc) = &book.toc {
            self.write_toc(book_id, toc, locale)?;
        }
        Ok(())
    }

    fn write_authors(&self, book_id: i64, authors: &[Author], locale: &Locale) -> Result<()> {
        let repo = SqliteAuthorRepository::new(self.conn);
        self.conn
            .execute("DELETE FROM book_authors WHERE book_id = ?1", params![book_id])?;
        for (position, author) in authors.iter().enumerate() {
            let author_id = repo.upsert(author, author.id, locale)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO book_authors (book_id, author_id, author_type, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![book_id, author_id, author.author_type.bits(), position as i64],
            )?;
        }
        Ok(())
    }

    fn write_series(&self, book_id: i64, series: &[Series], locale: &Locale) -> Result<()> {
        let repo = SqliteSeriesRepository::new(self.conn);
        self.conn
            .execute("DELETE FROM book_series WHERE book_id = ?1", params![book_id])?;
        for (position, entry) in series.iter().enumerate() {
            let series_id = repo.upsert(entry, entry.id, locale)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO book_series (book_id, series_id, number, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![book_id, series_id, entry.number, position as i64],
            )?;
        }
        Ok(())
    }

    fn write_publishers(&self, book_id: i64, publishers: &[Publisher], locale: &Locale) -> Result<()> {
        let repo = SqlitePublisherRepository::new(self.conn);
        self.conn
            .execute("DELETE FROM book_publishers WHERE book_id = ?1", params![book_id])?;
        for (position, publisher) in publishers.iter().enumerate() {
            let publisher_id = repo.upsert(publisher, publisher.id, locale)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO book_publishers (book_id, publisher_id, position)
                 VALUES (?1, ?2, ?3)",
                params![book_id, publisher_id, position as i64],
            )?;
        }
        Ok(())
    }

    fn write_toc(&self, book_id: i64, toc: &[TocEntry], locale: &Locale) -> Result<()> {
        let repo = SqliteTocRepository::new(self.conn);
        self.conn
            .execute("DELETE FROM book_toc WHERE book_id = ?1", params![book_id])?;
        for (position, entry) in toc.iter().enumerate() {
            let toc_id = repo.upsert(entry, entry.id, locale)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO book_toc (book_id, toc_id, position) VALUES (?1, ?2, ?3)",
                params![book_id, toc_id, position as i64],
            )?;
        }
        Ok(())
    }

    fn read_authors(&self, book_id: i64) -> Result<Vec<Author>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_id, author_type FROM book_authors WHERE book_id = ?1 ORDER BY position",
        )?;
        let links = stmt
            .query_map(params![book_id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, u32>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let repo = SqliteAuthorRepository::new(self.conn);
        let mut authors = Vec::with_capacity(links.len());
        for (author_id, bits) in links {
            if let Some(mut author) = repo.find_by_id(author_id)? {
                author.author_type = AuthorType::from_bits_truncate(bits);
                authors.push(author);
            }
        }
        Ok(authors)
    }

    fn read_series(&self, book_id: i64) -> Result<Vec<Series>> {
        let mut stmt = self.conn.prepare(
            "SELECT series_id, number FROM book_series WHERE book_id = ?1 ORDER BY position",
        )?;
        let links = stmt
            .query_map(params![book_id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let repo = SqliteSeriesRepository::new(self.conn);
        let mut series = Vec::with_capacity(links.len());
        for (series_id, number) in links {
            if let Some(entry) = repo.find_by_id(series_id)? {
                series.push(entry.with_number(number));
            }
        }
        Ok(series)
    }

    fn read_publishers(&self, book_id: i64) -> Result<Vec<Publisher>> {
        let mut stmt = self.conn.prepare(
            "SELECT publisher_id FROM book_publishers WHERE book_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![book_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let repo = SqlitePublisherRepository::new(self.conn);
        let mut publishers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(publisher) = repo.find_by_id(id)? {
                publishers.push(publisher);
            }
        }
        Ok(publishers)
    }

    fn read_toc(&self, book_id: i64) -> Result<Vec<TocEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT toc_id FROM book_toc WHERE book_id = ?1 ORDER BY position")?;
        let ids = stmt
            .query_map(params![book_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let repo = SqliteTocRepository::new(self.conn);
        let mut toc = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = repo.find_by_id(id)? {
                toc.push(entry);
            }
        }
        Ok(toc)
    }
}
