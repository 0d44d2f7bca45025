//! Embedded in-memory search engine driver
//!
//! The reference implementation of [`SearchEngine`]: staged writes become
//! visible only at commit, documents are stored structurally so slot
//! order is preserved exactly, and result order is deterministic (score
//! descending, id ascending). Free-text matching is plain case-folded
//! substring search over rendered field values; relevance tuning is not
//! this crate's concern.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};
use crate::error::Result;

use super::{EngineHit, EngineResponse, Query, SearchEngine, SearchRequest};

/// Operation counters, for tests and run reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineStats {
    /// Batches submitted via `add_batch`
    pub batches: u64,
    /// Documents submitted across all batches
    pub documents: u64,
    pub commits: u64,
    pub deletes: u64,
    pub queries: u64,
    pub optimizes: u64,
}

enum Staged {
    Add(Document),
    Delete(String),
    Clear,
}

#[derive(Default)]
struct EngineState {
    visible: BTreeMap<String, Document>,
    staged: Vec<Staged>,
    stats: EngineStats,
}

/// In-memory [`SearchEngine`] with real commit-visibility semantics.
#[derive(Default)]
pub struct MemoryEngine {
    state: Mutex<EngineState>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> EngineStats {
        self.state.lock().stats
    }

    /// Number of committed documents.
    pub fn document_count(&self) -> usize {
        self.state.lock().visible.len()
    }

    /// Committed document by id, bypassing the query path.
    pub fn committed(&self, id: &str) -> Option<Document> {
        self.state.lock().visible.get(id).cloned()
    }
}

impl SearchEngine for MemoryEngine {
    fn add_batch(&self, documents: &[Document]) -> Result<()> {
        let mut state = self.state.lock();
        state.stats.batches += 1;
        state.stats.documents += documents.len() as u64;
        for doc in documents {
            state.staged.push(Staged::Add(doc.clone()));
        }
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.stats.commits += 1;
        let staged = std::mem::take(&mut state.staged);
        for op in staged {
            match op {
                Staged::Add(doc) => {
                    state.visible.insert(doc.id().to_string(), doc);
                }
                Staged::Delete(id) => {
                    state.visible.remove(&id);
                }
                Staged::Clear => {
                    state.visible.clear();
                }
            }
        }
        Ok(())
    }

    fn optimize(&self) -> Result<()> {
        self.state.lock().stats.optimizes += 1;
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.stats.deletes += 1;
        state.staged.push(Staged::Delete(id.to_string()));
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.stats.deletes += 1;
        state.staged.push(Staged::Clear);
        Ok(())
    }

    fn query(&self, request: &SearchRequest) -> Result<EngineResponse> {
        let mut state = self.state.lock();
        state.stats.queries += 1;

        let mut matched: Vec<(f32, &Document)> = state
            .visible
            .values()
            .filter_map(|doc| score(doc, &request.query).map(|s| (s, doc)))
            .collect();
        matched.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id().cmp(b.1.id()))
        });

        let total = matched.len() as u64;
        let page: Vec<EngineHit> = matched
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|(s, doc)| EngineHit {
                document: doc.clone(),
                score: s,
            })
            .collect();

        let mut highlights = BTreeMap::new();
        if request.highlight {
            if let Query::Parse(needle) = &request.query {
                for hit in &page {
                    let snippets = snippet_fields(&hit.document, needle);
                    if !snippets.is_empty() {
                        highlights.insert(hit.document.id().to_string(), snippets);
                    }
                }
            }
        }

        Ok(EngineResponse {
            hits: page,
            total,
            highlights,
        })
    }
}

/// Relevance of a committed document against the criteria; `None` for no
/// match. Free-text scores count matching fields.
fn score(doc: &Document, query: &Query) -> Option<f32> {
    match query {
        Query::All => Some(1.0),
        Query::Term { field, value } => {
            if field == "id" {
                (doc.id() == value).then_some(1.0)
            } else {
                let flat = doc.flatten();
                flat.get(field)
                    .is_some_and(|slots| {
                        slots
                            .iter()
                            .flatten()
                            .any(|v| v.render() == *value)
                    })
                    .then_some(1.0)
            }
        }
        Query::Parse(raw) => {
            let needle = raw.to_lowercase();
            let matched = doc
                .flatten()
                .values()
                .filter(|slots| {
                    slots
                        .iter()
                        .flatten()
                        .any(|v| v.render().to_lowercase().contains(&needle))
                })
                .count();
            (matched > 0).then(|| matched as f32)
        }
        Query::Any(queries) => queries
            .iter()
            .filter_map(|q| score(doc, q))
            .reduce(f32::max),
    }
}

/// Fields whose rendered values contain the needle, with the matching
/// values as snippets.
fn snippet_fields(doc: &Document, raw: &str) -> BTreeMap<String, Vec<String>> {
    let needle = raw.to_lowercase();
    let mut out = BTreeMap::new();
    for (name, slots) in doc.flatten() {
        let values: Vec<String> = slots
            .iter()
            .flatten()
            .map(FieldValue::render)
            .filter(|v| v.to_lowercase().contains(&needle))
            .collect();
        if !values.is_empty() {
            out.insert(name, values);
        }
    }
    out
}
