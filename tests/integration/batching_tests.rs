//! Flush and commit sequencing against a recording engine

use std::sync::Arc;

use stacks::codec::DocumentCodec;
use stacks::config::IndexConfig;
use stacks::index::IndexWriter;

use crate::common::{RecordingEngine, collection};

fn config(add_batch_size: usize, commit_threshold: usize) -> IndexConfig {
    IndexConfig {
        add_batch_size,
        commit_threshold,
        ..IndexConfig::default()
    }
}

#[test]
fn multiple_flushes_single_commit_before_ancestry() {
    let engine = Arc::new(RecordingEngine::new());
    let mut writer = IndexWriter::new(engine.clone(), DocumentCodec::new(), &config(2, 100));

    // more than the add-batch threshold, fewer than the commit threshold
    for i in 0..5 {
        writer.add(&collection(&format!("col-{i}"), None)).unwrap();
    }
    writer.close().unwrap();

    let ops = engine.ops();
    // one flush mid-run, one at close, then the visibility barrier
    assert_eq!(ops[0], "add_batch:3");
    assert_eq!(ops[1], "add_batch:2");
    assert_eq!(ops[2], "commit");
    // no commit happened before the barrier
    assert_eq!(ops.iter().filter(|op| *op == "commit").count(), 2);
    assert_eq!(ops.last().map(String::as_str), Some("commit"));
}

#[test]
fn commit_threshold_commits_mid_run() {
    let engine = Arc::new(RecordingEngine::new());
    let mut writer = IndexWriter::new(engine.clone(), DocumentCodec::new(), &config(1, 3));

    for i in 0..6 {
        writer.add(&collection(&format!("col-{i}"), None)).unwrap();
    }

    let ops = engine.ops();
    // the second flush pushes the uncommitted count past the threshold
    assert!(ops.contains(&"commit".to_string()));
    let first_commit = ops.iter().position(|op| op == "commit").unwrap();
    assert!(ops[..first_commit].iter().all(|op| op.starts_with("add_batch")));
}

#[test]
fn removals_bypass_batching() {
    let engine = Arc::new(RecordingEngine::new());
    let mut writer = IndexWriter::new(engine.clone(), DocumentCodec::new(), &config(50, 100));

    writer.add(&collection("col-1", None)).unwrap();
    writer.remove("col-0").unwrap();

    let ops = engine.ops();
    // the delete reached the engine although nothing was flushed yet
    assert_eq!(ops, vec!["delete_by_id".to_string()]);
}
