//! Search engine driver boundary
//!
//! The index's own storage engine is an external collaborator. This
//! module owns the driver trait the pipeline consumes (batch-add,
//! commit, optimize, delete, query) plus the query criteria types and
//! an embedded reference driver.
//!
//! The contract every driver must honor: a write is only guaranteed
//! readable after a subsequent `commit`, and the slot order of a
//! multi-valued field survives add → commit → query unchanged.

mod memory;

pub use memory::{EngineStats, MemoryEngine};

use std::collections::BTreeMap;

use crate::document::Document;
use crate::error::Result;

/// Query criteria handed to a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Match every committed document
    All,
    /// Free-text query in the engine's own syntax
    Parse(String),
    /// Exact match of one field value; `field = "id"` addresses the
    /// document key
    Term { field: String, value: String },
    /// Disjunction
    Any(Vec<Query>),
}

impl Query {
    pub fn parse(query: impl Into<String>) -> Self {
        Query::Parse(query.into())
    }

    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One driver-level query.
///
/// `params` are engine-specific name/value pairs passed through verbatim;
/// the pipeline never interprets them.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Query,
    pub offset: usize,
    pub limit: usize,
    pub params: Vec<(String, String)>,
    pub highlight: bool,
}

impl SearchRequest {
    pub fn new(query: Query, offset: usize, limit: usize) -> Self {
        Self {
            query,
            offset,
            limit,
            params: Vec::new(),
            highlight: false,
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// One matched document with its relevance score.
#[derive(Debug, Clone)]
pub struct EngineHit {
    pub document: Document,
    pub score: f32,
}

/// Driver response: one result page plus the total match count and any
/// highlighting snippets, keyed by document id then field.
#[derive(Debug, Clone, Default)]
pub struct EngineResponse {
    pub hits: Vec<EngineHit>,
    pub total: u64,
    pub highlights: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

/// The driver interface consumed by the writer, executor and facade.
///
/// Implementations are externally synchronized; the pipeline assumes
/// single-writer access for the duration of one indexing run.
pub trait SearchEngine: Send + Sync {
    /// Submit documents. A document whose id is already present replaces
    /// the stored document wholesale on commit.
    fn add_batch(&self, documents: &[Document]) -> Result<()>;

    /// Make every prior write observable to queries.
    fn commit(&self) -> Result<()>;

    fn optimize(&self) -> Result<()>;

    fn delete_by_id(&self, id: &str) -> Result<()>;

    fn delete_all(&self) -> Result<()>;

    fn query(&self, request: &SearchRequest) -> Result<EngineResponse>;
}
