//! In-memory byte-store and json package codec

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{Result, StacksError};
use crate::model::{Entity, EntityKind};

use super::{ArchiveStore, PackageCodec};

/// Package codec carrying entities as json documents.
///
/// The production package format (an XML object graph) lives behind the
/// [`PackageCodec`] trait; this codec is the embedded stand-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPackageCodec;

impl JsonPackageCodec {
    pub fn write_package(&self, entity: &Entity) -> Result<Vec<u8>> {
        serde_json::to_vec(entity)
            .map_err(|err| StacksError::InvalidPackage(format!("serialize {}: {err}", entity.id())))
    }
}

impl PackageCodec for JsonPackageCodec {
    fn parse_package(&self, bytes: &[u8]) -> Result<Entity> {
        serde_json::from_slice(bytes)
            .map_err(|err| StacksError::InvalidPackage(err.to_string()))
    }
}

struct PackageRecord {
    kind: EntityKind,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct StoreInner {
    packages: BTreeMap<String, PackageRecord>,
    content: BTreeMap<String, Vec<u8>>,
}

/// In-memory [`ArchiveStore`].
///
/// Packages are keyed by entity id; iteration order within a kind is the
/// sorted id order, which keeps archive runs deterministic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw package under an id.
    pub fn put_package(&self, kind: EntityKind, id: impl Into<String>, bytes: Vec<u8>) {
        self.inner
            .lock()
            .packages
            .insert(id.into(), PackageRecord { kind, bytes });
    }

    /// Serialize and store an entity as a json package.
    pub fn put_entity(&self, entity: &Entity) -> Result<()> {
        let bytes = JsonPackageCodec.write_package(entity)?;
        self.put_package(entity.kind(), entity.id(), bytes);
        Ok(())
    }

    /// Store a content blob under a reference id.
    pub fn put_content(&self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.inner.lock().content.insert(reference.into(), bytes);
    }
}

impl ArchiveStore for MemoryStore {
    fn list_entity_ids(&self, kind: EntityKind) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        Ok(inner
            .packages
            .iter()
            .filter(|(_, record)| record.kind == kind)
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn get_package(&self, id: &str) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        inner
            .packages
            .get(id)
            .map(|record| record.bytes.clone())
            .ok_or_else(|| StacksError::NotFound(id.to_string()))
    }

    fn get_content(&self, reference: &str) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        inner
            .content
            .get(reference)
            .cloned()
            .ok_or_else(|| StacksError::NotFound(reference.to_string()))
    }
}
