use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::locale::Locale;
use crate::models::Series;
use crate::normalize::normalize;

use super::Repository;

pub struct SqliteSeriesRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSeriesRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> Repository for SqliteSeriesRepository<'a> {
    type Entity = Series;

    fn find_by_id(&self, id: i64) -> Result<Option<Self::Entity>> {
        let series = self
            .conn
            .query_row(
                "SELECT id, title, complete FROM series WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Series {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        number: String::new(),
                        complete: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(series)
    }

    fn find_id(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM series WHERE title_ob = ?1 ORDER BY id LIMIT 1",
                params![normalize(&entity.title, locale)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.unwrap_or(0))
    }

    fn insert(&self, entity: &Self::Entity, locale: &Locale) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO series (title, title_ob, complete) VALUES (?1, ?2, ?3)",
            params![entity.title, normalize(&entity.title, locale), entity.complete],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, entity: &Self::Entity, id: i64, locale: &Locale) -> Result<()> {
        self.conn.execute(
            "UPDATE series SET title = ?2, title_ob = ?3, complete = ?4 WHERE id = ?1",
            params![id, entity.title, normalize(&entity.title, locale), entity.complete],
        )?;
        Ok(())
    }
}
