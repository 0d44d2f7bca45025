//! Byte-store and package boundaries
//!
//! The archival byte-store and the package deserializer are external
//! collaborators; this module owns only the traits the pipeline consumes
//! plus embedded implementations for tests and single-process use.

mod memory;

pub use memory::{JsonPackageCodec, MemoryStore};

use crate::error::Result;
use crate::model::{Entity, EntityKind};

/// The archival byte-store: durable packages and content blobs by id.
pub trait ArchiveStore: Send + Sync {
    /// Ids of every stored entity of the given kind, in stable order.
    fn list_entity_ids(&self, kind: EntityKind) -> Result<Vec<String>>;

    /// The raw package stream for an entity id.
    fn get_package(&self, id: &str) -> Result<Vec<u8>>;

    /// A content blob by reference id (metadata blobs, file payloads).
    fn get_content(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Deserializer for the archive's package format.
pub trait PackageCodec: Send + Sync {
    fn parse_package(&self, bytes: &[u8]) -> Result<Entity>;
}
