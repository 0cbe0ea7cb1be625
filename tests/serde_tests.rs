#![cfg(feature = "serde")]

//! Integration tests for serde support in taskdex.

use chrono::{TimeZone, Utc};
use rstest::rstest;
use taskdex::config::StoreConfig;
use taskdex::domain::{Task, TaskId, TaskStatus, Timestamp};
use taskdex::index::InvertedIndex;
use taskdex::persistent::PostingSet;
use taskdex::store::{Action, Store};
use taskdex::tokenize::Tokenizer;

fn at(seconds: i64) -> Timestamp {
    Timestamp::from_datetime(Utc.timestamp_opt(seconds, 0).single().unwrap())
}

// =============================================================================
// Index dump
// =============================================================================

#[rstest]
fn test_index_serializes_as_sorted_token_map() {
    let index: InvertedIndex = InvertedIndex::build(
        Tokenizer::default(),
        &[(TaskId::new(2), "Buy bread"), (TaskId::new(1), "Buy milk")],
    );
    let json = serde_json::to_string(&index).unwrap();
    assert_eq!(json, r#"{"bread":[2],"buy":[1,2],"milk":[1]}"#);
}

#[rstest]
fn test_dump_contains_only_live_tokens() {
    let index: InvertedIndex = InvertedIndex::build(Tokenizer::default(), &[(TaskId::new(1), "Buy milk")])
        .remove(&TaskId::new(1), "Buy milk");
    assert_eq!(serde_json::to_string(&index).unwrap(), "{}");
}

#[rstest]
fn test_posting_set_serializes_as_sequence() {
    let set: PostingSet<u64> = [3, 1, 2].into_iter().collect();
    assert_eq!(serde_json::to_string(&set).unwrap(), "[1,2,3]");
}

// =============================================================================
// Domain types
// =============================================================================

#[rstest]
fn test_task_json_roundtrip() {
    let task = Task::new(TaskId::new(7), "Buy milk", "two litres", at(0)).with_status(TaskStatus::Completed);
    let json = serde_json::to_string(&task).unwrap();
    assert!(json.contains(r#""id":7"#));
    assert!(json.contains(r#""status":"completed""#));

    let restored: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, task);
}

// =============================================================================
// Snapshot
// =============================================================================

#[rstest]
fn test_snapshot_serializes_records_index_and_settings() {
    let store = Store::new(&StoreConfig::default());
    store.dispatch_at(&Action::add("Team standup", "").unwrap(), at(1));

    let value = serde_json::to_value(&*store.state()).unwrap();
    assert_eq!(value["records"][0]["title"], "Team standup");
    assert_eq!(value["index"]["team"], serde_json::json!([1]));
    assert_eq!(value["settings"]["complete_color"], "#E6F4EA");
    assert_eq!(value["next_id"], 2);
}
