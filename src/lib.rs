//! stacks - digital preservation indexing
//!
//! Flattens a graph of typed archival entities (collections,
//! deliverable units, manifestations, files, events) into denormalized
//! search documents, then performs a second pass over the committed
//! index to materialize derived attributes (transitive ancestry,
//! propagated event metadata) that no single entity can supply on its
//! own.
//!
//! The search engine itself, the archival byte-store and the package
//! format are external collaborators behind the [`engine::SearchEngine`],
//! [`store::ArchiveStore`] and [`store::PackageCodec`] traits; embedded
//! in-memory implementations are provided for tests and single-process
//! use.

pub mod codec;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod store;

pub use codec::DocumentCodec;
pub use config::IndexConfig;
pub use document::{Document, FieldValue};
pub use error::{Result, StacksError};
pub use index::{ArchiveIndex, IndexReport, IndexWriter, QueryExecutor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
