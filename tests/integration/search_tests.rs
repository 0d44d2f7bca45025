//! Public search surface: pagination, clamping, highlight context

use std::sync::Arc;

use stacks::config::IndexConfig;
use stacks::engine::{MemoryEngine, Query};
use stacks::index::ArchiveIndex;
use stacks::model::{Collection, Entity};
use stacks::store::{JsonPackageCodec, MemoryStore};

fn indexed_archive(count: usize, config: IndexConfig) -> ArchiveIndex {
    let store = Arc::new(MemoryStore::new());
    for i in 0..count {
        let mut c = Collection::new(format!("col-{i:03}"));
        c.title = Some(format!("Deposited survey {i}"));
        store.put_entity(&Entity::Collection(c)).unwrap();
    }
    let index = ArchiveIndex::with_config(
        Arc::new(MemoryEngine::new()),
        store,
        Arc::new(JsonPackageCodec),
        config,
    );
    index.index_archive().unwrap();
    index
}

#[test]
fn search_returns_ranked_page_with_context() {
    let index = indexed_archive(3, IndexConfig::default());
    let page = index.search("survey 1", 0, 10, &[]).unwrap();

    assert!(page.total >= 1);
    let top = &page.hits[0];
    assert_eq!(top.document.id(), "col-001");
    let context = top.context.as_deref().unwrap();
    assert!(context.contains("title: 'Deposited survey 1'"));
}

#[test]
fn search_offset_walks_the_result_set() {
    let index = indexed_archive(5, IndexConfig::default());

    let first = index.search("Deposited", 0, 2, &[]).unwrap();
    let second = index.search("Deposited", 2, 2, &[]).unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(second.total, 5);

    let first_ids: Vec<&str> = first.hits.iter().map(|h| h.document.id()).collect();
    let second_ids: Vec<&str> = second.hits.iter().map(|h| h.document.id()).collect();
    assert!(first_ids.iter().all(|id| !second_ids.contains(id)));
}

#[test]
fn oversized_limits_clamp_to_configured_maximum() {
    let config = IndexConfig {
        max_page_size: 2,
        ..IndexConfig::default()
    };
    let index = indexed_archive(5, config);

    assert_eq!(index.search("Deposited", 0, 0, &[]).unwrap().hits.len(), 2);
    assert_eq!(index.search("Deposited", 0, 99, &[]).unwrap().hits.len(), 2);
}

#[test]
fn passthrough_params_do_not_disturb_results() {
    let index = indexed_archive(2, IndexConfig::default());
    let params = vec![("facet.field".to_string(), "kind".to_string())];
    let page = index.search("Deposited", 0, 10, &params).unwrap();
    assert_eq!(page.total, 2);
}

#[test]
fn scroll_covers_everything_exactly_once() {
    let config = IndexConfig {
        scroll_page_size: 4,
        ..IndexConfig::default()
    };
    let index = indexed_archive(10, config);
    let executor = index.executor();

    let pages: Vec<_> = executor
        .scroll(Query::All)
        .collect::<stacks::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(pages.len(), 3);

    let mut ids: Vec<String> = pages
        .into_iter()
        .flatten()
        .map(|hit| hit.document.id().to_string())
        .collect();
    assert_eq!(ids.len(), 10);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}
