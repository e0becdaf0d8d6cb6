use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::locale::Locale;
use crate::models::Publisher;
use crate::normalize::normalize;

use super::Repository;

pub struct SqlitePublisherRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePublisherRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqlitePublisherRepository<'a> {
    type Entity = Publisher;

    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>> {
        let publisher = self
            .conn
            .query_row(
                "SELECT id, name FROM publishers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Publisher {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(publisher)
    }

    fn find_id(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM publishers WHERE name_ob = ?1 ORDER BY id LIMIT 1",
                params![normalize(&entity.name, locale)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.unwrap_or(0))
    }

    fn insert(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO publishers (name, name_ob) VALUES (?1, ?2)",
            params![entity.name, normalize(&entity.name, locale)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<()> {
        self.conn.execute(
            "UPDATE publishers SET name = ?2, name_ob = ?3 WHERE id = ?1",
            params![id, entity.name, normalize(&entity.name, locale)],
        )?;
        Ok(())
    }
}
