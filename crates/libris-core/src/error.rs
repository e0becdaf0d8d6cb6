use thiserror::Error;

/// All errors that can occur in libris-core.
#[derive(Debug, Error)]
pub enum LibrisError {
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    #[error("Entity not found: {entity} with id {id}")]
    EntityNotFound { entity: &'static str, id: i64 },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Migration error at version {version}: {message}")]
    Migration { version: u32, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, LibrisError>;
