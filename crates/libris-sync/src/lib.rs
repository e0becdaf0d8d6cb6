//! Per-field merge policy for incoming book records, cover storage and
//! author pseudonym resolving.

pub mod action;
pub mod covers;
pub mod error;
pub mod field;
pub mod processor;
pub mod resolver;

pub use action::SyncAction;
pub use covers::{CoverDirectory, CoverStore};
pub use error::{Result, SyncError};
pub use field::{FieldKind, SyncField};
pub use processor::{BatchReport, ProcessOutcome, SyncProcessor, SyncProcessorBuilder};
pub use resolver::{AuthorResolver, PseudonymTable, ResolveOutcome, resolve_authors};
