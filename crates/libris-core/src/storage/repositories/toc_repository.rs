use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::locale::Locale;
use crate::models::{PartialDate, TocEntry};
use crate::normalize::normalize;

use super::{Repository, SqliteAuthorRepository};

pub struct SqliteTocRepository<'a> {
    conn: &'a Connection,
    authors: SqliteAuthorRepository<'a>,
}

impl<'a> SqliteTocRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            authors: SqliteAuthorRepository::new(conn),
        }
    }

    /// The author row is only looked up or created, never rewritten.
    fn author_id(&self, entry: &TocEntry, locale: &Locale) -> Result<i64> {
        self.authors
            .find_or_insert(&entry.primary_author, entry.primary_author.id, locale)
    }
}

impl<'a> Repository for SqliteTocRepository<'a> {
    type Entity = TocEntry;

    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, author_id, title, first_publication, book_id
                 FROM toc_entries WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, author_id, title, first_publication, book_id)) = row else {
            return Ok(None);
        };
        let Some(author) = self.authors.find_by_id(author_id)? else {
            return Ok(None);
        };

        Ok(Some(TocEntry {
            id,
            title,
            primary_author: author,
            first_publication: first_publication.as_deref().and_then(PartialDate::parse),
            book_id,
        }))
    }

    fn find_id(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        let author_id = if entity.primary_author.id != 0 {
            entity.primary_author.id
        } else {
            self.authors.find_id(&entity.primary_author, locale)?
        };
        if author_id == 0 {
            return Ok(0);
        }

        let year = entity.first_publication_year().map(|y| format!("{y:04}"));
        let id = self
            .conn
            .query_row(
                "SELECT id FROM toc_entries
                 WHERE title_ob = ?1 AND author_id = ?2
                   AND (?3 IS NULL OR first_publication IS NULL
                        OR substr(first_publication, 1, 4) = ?3)
                 ORDER BY id LIMIT 1",
                params![normalize(&entity.title, locale), author_id, year],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.unwrap_or(0))
    }

    fn insert(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        let author_id = self.author_id(entity, locale)?;
        self.conn.execute(
            "INSERT INTO toc_entries (author_id, title, title_ob, first_publication, book_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                author_id,
                entity.title,
                normalize(&entity.title, locale),
                entity.first_publication.map(|d| d.to_string()),
                entity.book_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<()> {
        let author_id = self.author_id(entity, locale)?;
        self.conn.execute(
            "UPDATE toc_entries
             SET author_id = ?2, title = ?3, title_ob = ?4, first_publication = ?5, book_id = ?6
             WHERE id = ?1",
            params![
                id,
                author_id,
                entity.title,
                normalize(&entity.title, locale),
                entity.first_publication.map(|d| d.to_string()),
                entity.book_id,
            ],
        )?;
        Ok(())
    }
}
