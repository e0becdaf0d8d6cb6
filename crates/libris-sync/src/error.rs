use libris_core::LibrisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("credentials rejected by {0}")]
    Credentials(String),

    #[error("search failed on {0}: {1}")]
    Search(String, String),

    #[error("unknown sync action: {0}")]
    UnknownAction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] LibrisError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
