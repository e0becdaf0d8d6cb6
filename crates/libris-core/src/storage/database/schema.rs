use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS authors (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            family_name    TEXT NOT NULL,
            family_name_ob TEXT NOT NULL,
            given_names    TEXT NOT NULL DEFAULT '',
            given_names_ob TEXT NOT NULL DEFAULT '',
            complete       INTEGER NOT NULL DEFAULT 0,
            real_author    INTEGER REFERENCES authors(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS series (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            title    TEXT NOT NULL,
            title_ob TEXT NOT NULL,
            complete INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS publishers (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL,
            name_ob TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS toc_entries (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id         INTEGER NOT NULL REFERENCES authors(id),
            title             TEXT NOT NULL,
            title_ob          TEXT NOT NULL,
            first_publication TEXT,
            book_id           INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS books (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            fields     TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS book_authors (
            book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            author_id   INTEGER NOT NULL REFERENCES authors(id),
            author_type INTEGER NOT NULL DEFAULT 0,
            position    INTEGER NOT NULL,
            PRIMARY KEY (book_id, author_id)
        );

        CREATE TABLE IF NOT EXISTS book_series (
            book_id   INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            series_id INTEGER NOT NULL REFERENCES series(id),
            number    TEXT NOT NULL DEFAULT '',
            position  INTEGER NOT NULL,
            PRIMARY KEY (book_id, series_id)
        );

        CREATE TABLE IF NOT EXISTS book_publishers (
            book_id      INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            publisher_id INTEGER NOT NULL REFERENCES publishers(id),
            position     INTEGER NOT NULL,
            PRIMARY KEY (book_id, publisher_id)
        );

        CREATE TABLE IF NOT EXISTS book_toc (
            book_id  INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            toc_id   INTEGER NOT NULL REFERENCES toc_entries(id),
            position INTEGER NOT NULL,
            PRIMARY KEY (book_id, toc_id)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_authors_name_ob    ON authors(family_name_ob, given_names_ob);
        CREATE INDEX IF NOT EXISTS idx_series_title_ob    ON series(title_ob);
        CREATE INDEX IF NOT EXISTS idx_publishers_name_ob ON publishers(name_ob);
        CREATE INDEX IF NOT EXISTS idx_toc_title_ob       ON toc_entries(title_ob, author_id);
        ",
    )?;
    Ok(())
}
