//! Index writer, query executor and archive facade
//!
//! Data flow: entity stream → codec → writer (batch, commit) →
//! executor (resolve references) → writer (augment, commit) →
//! searchable index.

mod ancestry;
mod executor;
mod facade;
mod writer;

pub use executor::{QueryExecutor, Scroll, SearchHit, SearchPage};
pub use facade::{ArchiveIndex, IndexReport};
pub use writer::IndexWriter;
