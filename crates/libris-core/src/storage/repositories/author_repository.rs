use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::locale::Locale;
use crate::models::{Author, RealAuthor};
use crate::normalize::normalize;

use super::Repository;

pub struct SqliteAuthorRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteAuthorRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn find_id_by_name(&self, family_name: &str, given_names: &str, locale: &Locale) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM authors WHERE family_name_ob = ?1 AND given_names_ob = ?2
                 ORDER BY id LIMIT 1",
                params![normalize(family_name, locale), normalize(given_names, locale)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.unwrap_or(0))
    }

    /// Row id for a real-author handle, inserting a bare author if needed.
    fn resolve_real_author(&self, real: &RealAuthor, locale: &Locale) -> Result<i64> {
        self.find_or_insert(&real.to_author(), real.id, locale)
    }

    fn real_author_column(&self, entity: &Author, own_id: i64, locale: &Locale) -> Result<Option<i64>> {
        let Some(real) = &entity.real_author else {
            return Ok(None);
        };
        let id = self.resolve_real_author(real, locale)?;
        // An author is never its own pen name.
        Ok((id != own_id).then_some(id))
    }
}

impl<'a> Repository for SqliteAuthorRepository<'a> {
    type Entity = Author;

    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>> {
        let author = self
            .conn
            .query_row(
                "SELECT a.id, a.family_name, a.given_names, a.complete,
                        r.id, r.family_name, r.given_names
                 FROM authors a
                 LEFT JOIN authors r ON r.id = a.real_author
                 WHERE a.id = ?1",
                params![id],
                |row| {
                    let real_id: Option<i64> = row.get(4)?;
                    let real_author = match real_id {
                        Some(real_id) => Some(RealAuthor {
                            id: real_id,
                            family_name: row.get(5)?,
                            given_names: row.get(6)?,
                        }),
                        None => None,
                    };
                    Ok(Author {
                        id: row.get(0)?,
                        family_name: row.get(1)?,
                        given_names: row.get(2)?,
                        author_type: Default::default(),
                        complete: row.get(3)?,
                        real_author,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    fn find_id(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        self.find_id_by_name(&entity.family_name, &entity.given_names, locale)
    }

    fn insert(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        let real_author = self.real_author_column(entity, 0, locale)?;
        self.conn.execute(
            "INSERT INTO authors
                (family_name, family_name_ob, given_names, given_names_ob, complete, real_author)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entity.family_name,
                normalize(&entity.family_name, locale),
                entity.given_names,
                normalize(&entity.given_names, locale),
                entity.complete,
                real_author,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// A stored real author is kept when `entity` carries none.
    fn update(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<()> {
        let real_author = self.real_author_column(entity, id, locale)?;
        self.conn.execute(
            "UPDATE authors
             SET family_name = ?2, family_name_ob = ?3, given_names = ?4,
                 given_names_ob = ?5, complete = ?6, real_author = COALESCE(?7, real_author)
             WHERE id = ?1",
            params![
                id,
                entity.family_name,
                normalize(&entity.family_name, locale),
                entity.given_names,
                normalize(&entity.given_names, locale),
                entity.complete,
                real_author,
            ],
        )?;
        Ok(())
    }


    fn exists(&self, id: i64) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM authors WHERE id = ?1")?
            .exists(params![id])?;
        Ok(exists)
    }
}
