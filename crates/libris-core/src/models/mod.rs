pub mod author;
pub mod book;
pub mod date;
pub mod keys;
pub mod publisher;
pub mod series;
pub mod toc;

pub use author::{Author, AuthorType, RealAuthor};
pub use book::{Book, Field, FieldValue};
pub use date::PartialDate;
pub use publisher::Publisher;
pub use series::Series;
pub use toc::TocEntry;
