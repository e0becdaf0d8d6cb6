pub mod config;
pub mod error;
pub mod locale;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod prune;
pub mod storage;

pub use config::{AppConfig, CoreConfig, SyncConfig};
pub use error::{LibrisError, Result};
pub use locale::Locale;
pub use merge::{Mergeable, reconcile_id};
pub use models::*;
pub use normalize::{author_key, normalize, split_author_name};
pub use prune::{prune, prune_with_lookup};

pub use storage::database::{ConnectionPool, Database};
pub use storage::repositories::{
    Repository, SqliteAuthorRepository, SqliteBookRepository, SqlitePublisherRepository,
    SqliteSeriesRepository, SqliteTocRepository,
};
pub use storage::{BookStore, EntityStore};
