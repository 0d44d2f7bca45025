//! Stateless paginated query execution
//!
//! The executor owns page-limit clamping, highlight-context assembly and
//! the unbounded scroll iterator; the engine driver owns everything
//! else. Engine failures surface unchanged; callers that need
//! resilience retry the whole call.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::warn;

use crate::config::IndexConfig;
use crate::document::Document;
use crate::engine::{Query, SearchEngine, SearchRequest};
use crate::error::Result;

/// One search match, with an optional human-readable highlight context.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
    /// Concatenated snippet fields, `field: 'snippet' ` each; absent
    /// when the engine returned no highlighting data for this match.
    pub context: Option<String>,
}

/// One page of ranked matches plus the total match count.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub total: u64,
}

/// Stateless query execution against a committed index.
pub struct QueryExecutor {
    engine: Arc<dyn SearchEngine>,
    scroll_page_size: usize,
    max_page_size: usize,
}

impl QueryExecutor {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &IndexConfig) -> Self {
        Self {
            engine,
            scroll_page_size: config.scroll_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Free-text search with engine-specific passthrough parameters and
    /// highlighting. A `limit` of zero or above the configured maximum
    /// is clamped to the maximum.
    pub fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        params: &[(String, String)],
    ) -> Result<SearchPage> {
        let request = SearchRequest::new(Query::parse(query), offset, self.clamp(limit))
            .with_params(params.to_vec())
            .with_highlight(true);
        self.run(&request)
    }

    /// Structured query without highlighting; used by the
    /// materialization passes and available to callers that know the
    /// field layout.
    pub fn query(&self, query: Query, offset: usize, limit: usize) -> Result<SearchPage> {
        self.run(&SearchRequest::new(query, offset, self.clamp(limit)))
    }

    /// The committed document for an id, if any.
    pub fn lookup_by_id(&self, id: &str) -> Result<Option<Document>> {
        let page = self.query(Query::term("id", id), 0, 1)?;
        Ok(page.hits.into_iter().next().map(|hit| hit.document))
    }

    /// Unbounded iteration over every match, one page at a time.
    pub fn scroll(&self, query: Query) -> Scroll<'_> {
        Scroll {
            executor: self,
            query,
            offset: 0,
            page_size: self.scroll_page_size,
            finished: false,
        }
    }

    fn clamp(&self, limit: usize) -> usize {
        if limit == 0 || limit > self.max_page_size {
            self.max_page_size
        } else {
            limit
        }
    }

    fn run(&self, request: &SearchRequest) -> Result<SearchPage> {
        let response = self.engine.query(request)?;
        let hits = response
            .hits
            .into_iter()
            .map(|hit| {
                let context = response
                    .highlights
                    .get(hit.document.id())
                    .map(|fields| {
                        let mut out = String::new();
                        for (name, snippets) in fields {
                            for snippet in snippets {
                                let _ = write!(out, "{name}: '{snippet}' ");
                            }
                        }
                        out
                    })
                    .filter(|context| !context.is_empty());
                SearchHit {
                    document: hit.document,
                    score: hit.score,
                    context,
                }
            })
            .collect();
        Ok(SearchPage {
            hits,
            total: response.total,
        })
    }
}

/// Pages through a result set by re-querying with an advancing offset.
///
/// Stops at the first empty page. Refuses to advance past the maximum
/// representable offset rather than silently wrapping on very large
/// result sets.
pub struct Scroll<'a> {
    executor: &'a QueryExecutor,
    query: Query,
    offset: usize,
    page_size: usize,
    finished: bool,
}

impl Iterator for Scroll<'_> {
    type Item = Result<Vec<SearchHit>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let page = match self
            .executor
            .query(self.query.clone(), self.offset, self.page_size)
        {
            Ok(page) => page,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };
        if page.hits.is_empty() {
            self.finished = true;
            return None;
        }
        match self.offset.checked_add(self.page_size) {
            Some(next) => self.offset = next,
            None => {
                warn!("scroll offset would overflow, stopping iteration");
                self.finished = true;
            }
        }
        Some(Ok(page.hits))
    }
}
