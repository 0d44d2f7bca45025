//! Whole-archive runs through the facade

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use stacks::config::IndexConfig;
use stacks::document::field;
use stacks::engine::MemoryEngine;
use stacks::index::ArchiveIndex;
use stacks::model::EntityKind;
use stacks::store::{JsonPackageCodec, MemoryStore};

use crate::common::{collection, event, file, init_tracing, manifestation, unit_in_collections, unique_id};

fn populated_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let ingest = Utc.with_ymd_and_hms(2014, 2, 3, 8, 0, 0).unwrap();

    for entity in [
        collection("col-a", None),
        collection("col-b", Some("col-a")),
        unit_in_collections("deu-d", &["col-b"]),
        manifestation("man-m", "deu-d", &["file-f"]),
        file("file-f"),
        event("evt-1", "ingest", ingest, &["deu-d"]),
    ] {
        store.put_entity(&entity).unwrap();
    }
    // a package that will never parse; both runs must skip it alike
    store.put_package(EntityKind::Collection, "col-bad", b"{truncated".to_vec());
    store
}

/// The aspects of the document set that must be stable across reruns:
/// ids, ancestry, propagated event fields.
fn snapshot(index: &ArchiveIndex) -> BTreeMap<String, (Vec<String>, Option<String>, Vec<(String, DateTime<Utc>)>)> {
    let executor = index.executor();
    let mut out = BTreeMap::new();
    for id in ["col-a", "col-b", "deu-d", "man-m", "file-f", "evt-1"] {
        let doc = executor.lookup_by_id(id).unwrap().unwrap();
        let mut ancestors = doc.ancestors();
        ancestors.sort();
        let event_dates = doc
            .event_dates()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.insert(
            id.to_string(),
            (
                ancestors,
                doc.text(field::EVENT_OUTCOME).map(str::to_string),
                event_dates,
            ),
        );
    }
    out
}

#[test]
fn index_archive_builds_full_document_set() {
    init_tracing();
    let engine = Arc::new(MemoryEngine::new());
    let index = ArchiveIndex::new(engine.clone(), populated_store(), Arc::new(JsonPackageCodec));

    let report = index.index_archive().unwrap();
    assert_eq!(report.indexed, 6);
    assert_eq!(report.skipped, 1);
    assert_eq!(engine.document_count(), 6);

    let state = snapshot(&index);
    assert_eq!(state["deu-d"].0, vec!["col-a", "col-b"]);
    assert_eq!(state["file-f"].0, vec!["col-a", "col-b", "deu-d", "man-m"]);
    assert_eq!(state["deu-d"].1.as_deref(), Some("ingest ok"));
}

#[test]
fn clear_and_reindex_is_idempotent() {
    let engine = Arc::new(MemoryEngine::new());
    let index = ArchiveIndex::new(engine.clone(), populated_store(), Arc::new(JsonPackageCodec));

    let first_report = index.index_archive().unwrap();
    let first = snapshot(&index);

    index.clear().unwrap();
    assert_eq!(engine.document_count(), 0);

    let second_report = index.index_archive().unwrap();
    let second = snapshot(&index);

    assert_eq!(first_report.indexed, second_report.indexed);
    assert_eq!(first_report.skipped, second_report.skipped);
    assert_eq!(first, second);
}

#[test]
fn incremental_writer_replaces_documents() {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(MemoryEngine::new());
    let index = ArchiveIndex::new(engine.clone(), store, Arc::new(JsonPackageCodec));

    let id = unique_id("col");
    let mut writer = index.writer();
    writer.add(&collection(&id, None)).unwrap();
    writer.close().unwrap();
    assert!(index.entity(&id).unwrap().is_some());

    let mut writer = index.writer();
    writer.remove(&id).unwrap();
    writer.close().unwrap();
    assert!(index.entity(&id).unwrap().is_none());
}

#[test]
fn custom_config_flows_through_facade() {
    let config = IndexConfig {
        add_batch_size: 1,
        ..IndexConfig::default()
    };
    let engine = Arc::new(MemoryEngine::new());
    let index = ArchiveIndex::with_config(
        engine.clone(),
        populated_store(),
        Arc::new(JsonPackageCodec),
        config,
    );

    index.index_archive().unwrap();
    // batch size 1 forces a flush every second add
    assert!(engine.stats().batches >= 3);
}
