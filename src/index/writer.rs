//! Batched index writer with two-pass materialization
//!
//! One writer instance owns one indexing run. Calls are strictly
//! sequential; the writer is not safe for concurrent use and the
//! pipeline assumes single-writer access to the engine for the run's
//! duration.
//!
//! ## Close protocol
//!
//! `close()` performs, in order:
//! 1. flush the remaining pending batch and commit. This is the
//!    visibility barrier: nothing written before it is guaranteed
//!    readable until this commit completes;
//! 2. the ancestry pass over every added id, then one commit;
//! 3. the event pass, committing once per event so that a later event
//!    targeting the same entity observes the earlier event's write.
//!
//! The first engine failure aborts the close; writes already committed
//! remain in place and the expected recovery is a whole re-run.

use std::sync::Arc;

use tracing::debug;

use crate::codec::DocumentCodec;
use crate::config::IndexConfig;
use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::{Result, StacksError};
use crate::model::Entity;

use super::ancestry;
use super::executor::QueryExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Closing,
    Closed,
}

/// Accepts entities, batches their documents into the engine, and runs
/// the materialization passes on close.
pub struct IndexWriter {
    engine: Arc<dyn SearchEngine>,
    executor: QueryExecutor,
    codec: DocumentCodec,
    add_batch_size: usize,
    commit_threshold: usize,
    pending: Vec<Document>,
    added_ids: Vec<String>,
    uncommitted: usize,
    state: WriterState,
}

impl IndexWriter {
    pub fn new(engine: Arc<dyn SearchEngine>, codec: DocumentCodec, config: &IndexConfig) -> Self {
        Self {
            executor: QueryExecutor::new(engine.clone(), config),
            engine,
            codec,
            add_batch_size: config.add_batch_size,
            commit_threshold: config.commit_threshold,
            pending: Vec::new(),
            added_ids: Vec::new(),
            uncommitted: 0,
            state: WriterState::Open,
        }
    }

    /// Encode an entity and queue its document for indexing.
    pub fn add(&mut self, entity: &Entity) -> Result<()> {
        self.ensure_open()?;
        let doc = self.codec.encode(entity)?;
        self.added_ids.push(doc.id().to_string());
        self.pending.push(doc);
        if self.pending.len() > self.add_batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Delete a document by id, immediately; removals are not batched.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.ensure_open()?;
        self.engine.delete_by_id(id)
    }

    /// Flush, commit, and run both materialization passes. The writer
    /// accepts no further calls afterwards, whether the close succeeded
    /// or not.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = WriterState::Closing;

        if !self.pending.is_empty() {
            self.flush()?;
        }
        self.engine.commit()?;
        self.uncommitted = 0;
        debug!("visibility barrier committed, {} ids added", self.added_ids.len());

        ancestry::apply_ancestry(&self.executor, self.engine.as_ref(), &self.codec, &self.added_ids)?;
        self.engine.commit()?;

        ancestry::propagate_events(&self.executor, self.engine.as_ref(), &self.codec, &self.added_ids)?;

        self.state = WriterState::Closed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            WriterState::Open => Ok(()),
            WriterState::Closing | WriterState::Closed => Err(StacksError::WriterClosed),
        }
    }

    /// Submit the pending batch without committing, then commit if the
    /// uncommitted count has crossed the threshold.
    fn flush(&mut self) -> Result<()> {
        debug!("flushing {} pending documents", self.pending.len());
        self.engine.add_batch(&self.pending)?;
        self.uncommitted += self.pending.len();
        self.pending.clear();
        if self.uncommitted > self.commit_threshold {
            debug!("committing after {} uncommitted documents", self.uncommitted);
            self.engine.commit()?;
            self.uncommitted = 0;
        }
        Ok(())
    }
}
