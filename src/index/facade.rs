//! Whole-archive orchestration
//!
//! [`ArchiveIndex`] ties the byte-store, the package codec and the
//! engine driver together: it drives full reindexing runs, hands out
//! writers and executors, and answers the entity-level lookups the
//! service layer needs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codec::DocumentCodec;
use crate::config::IndexConfig;
use crate::engine::SearchEngine;
use crate::error::{Result, StacksError};
use crate::model::{Entity, EntityKind};
use crate::store::{ArchiveStore, PackageCodec};

use super::executor::{QueryExecutor, SearchPage};
use super::writer::IndexWriter;

/// Summary of one archive indexing run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndexReport {
    /// Entities successfully handed to the writer
    pub indexed: usize,
    /// Entities skipped after a per-entity failure
    pub skipped: usize,
}

/// Facade over one archive and one search index.
pub struct ArchiveIndex {
    engine: Arc<dyn SearchEngine>,
    store: Arc<dyn ArchiveStore>,
    packages: Arc<dyn PackageCodec>,
    config: IndexConfig,
}

impl ArchiveIndex {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        store: Arc<dyn ArchiveStore>,
        packages: Arc<dyn PackageCodec>,
    ) -> Self {
        Self::with_config(engine, store, packages, IndexConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn SearchEngine>,
        store: Arc<dyn ArchiveStore>,
        packages: Arc<dyn PackageCodec>,
        config: IndexConfig,
    ) -> Self {
        Self {
            engine,
            store,
            packages,
            config,
        }
    }

    /// A fresh writer for an incremental update; the caller drives
    /// `add`/`remove` and must close it exactly once.
    pub fn writer(&self) -> IndexWriter {
        let codec = DocumentCodec::new().with_content_store(self.store.clone());
        IndexWriter::new(self.engine.clone(), codec, &self.config)
    }

    pub fn executor(&self) -> QueryExecutor {
        QueryExecutor::new(self.engine.clone(), &self.config)
    }

    /// Stream every entity of every kind out of the byte-store and into
    /// one writer, closing it at the end to run the materialization
    /// passes. Per-entity failures are logged and skipped; the run only
    /// aborts on an engine failure during close or a store failure while
    /// listing ids.
    pub fn index_archive(&self) -> Result<IndexReport> {
        let mut writer = self.writer();
        let mut report = IndexReport::default();

        for kind in EntityKind::ARCHIVE_ORDER {
            let ids = self.store.list_entity_ids(kind)?;
            info!("indexing {} entities of kind {kind}", ids.len());
            for id in ids {
                let added = self
                    .load_entity(kind, &id)
                    .and_then(|entity| writer.add(&entity));
                match added {
                    Ok(()) => report.indexed += 1,
                    Err(err) => {
                        warn!("skipping {kind} {id}: {err}");
                        report.skipped += 1;
                    }
                }
            }
        }

        writer.close()?;
        info!(
            "archive indexing complete: {} indexed, {} skipped",
            report.indexed, report.skipped
        );
        Ok(report)
    }

    /// Delete every document and commit.
    pub fn clear(&self) -> Result<()> {
        self.engine.delete_all()?;
        self.engine.commit()
    }

    pub fn optimize(&self) -> Result<()> {
        self.engine.optimize()
    }

    /// Free-text search over the committed index.
    pub fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        params: &[(String, String)],
    ) -> Result<SearchPage> {
        self.executor().search(query, offset, limit, params)
    }

    /// The indexed entity for an id, decoded back from its document.
    pub fn entity(&self, id: &str) -> Result<Option<Entity>> {
        let Some(doc) = self.executor().lookup_by_id(id)? else {
            return Ok(None);
        };
        DocumentCodec::new().decode(&doc).map(Some)
    }

    /// When the entity's document was last written, if it is indexed.
    pub fn last_modified(&self, id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .executor()
            .lookup_by_id(id)?
            .and_then(|doc| doc.indexed_at()))
    }

    fn load_entity(&self, kind: EntityKind, id: &str) -> Result<Entity> {
        let bytes = self.store.get_package(id)?;
        let entity = self.packages.parse_package(&bytes)?;
        if entity.kind() != kind {
            return Err(StacksError::InvalidPackage(format!(
                "package {id} holds a {} where a {kind} was expected",
                entity.kind()
            )));
        }
        if entity.id() != id {
            return Err(StacksError::InvalidPackage(format!(
                "package {id} holds entity {}",
                entity.id()
            )));
        }
        Ok(entity)
    }
}
