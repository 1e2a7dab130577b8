//! Integration tests for resilient JSONL loading from disk.

use linchpin_jsonl::{read_jsonl_resilient, write_jsonl_atomic, Error, Warning};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct EdgeRecord {
    id: String,
    from_id: String,
    to_id: String,
    #[serde(default)]
    lag_days: i32,
}

fn edge(id: &str, from: &str, to: &str) -> EdgeRecord {
    EdgeRecord {
        id: id.to_string(),
        from_id: from.to_string(),
        to_id: to.to_string(),
        lag_days: 0,
    }
}

#[tokio::test]
async fn written_records_load_back_in_order() {
    let file = NamedTempFile::new().unwrap();
    let records = vec![edge("dep-1", "b", "a"), edge("dep-2", "c", "b")];

    write_jsonl_atomic(file.path(), &records).await.unwrap();
    let (loaded, warnings) = read_jsonl_resilient::<EdgeRecord, _>(file.path())
        .await
        .unwrap();

    assert_eq!(loaded, records);
    assert!(warnings.is_empty());
}

#[tokio::test]
async fn corrupted_lines_become_warnings() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"id":"dep-1","from_id":"b","to_id":"a"}}"#).unwrap();
    writeln!(file, r#"{{"id":"dep-2","from_id":"c""#).unwrap();
    writeln!(file).unwrap();
    writeln!(file, r#"{{"id":"dep-3","from_id":"d","to_id":"c","lag_days":2}}"#).unwrap();
    writeln!(file, r#"{{"unexpected":true}}"#).unwrap();
    file.flush().unwrap();

    let (loaded, warnings) = read_jsonl_resilient::<EdgeRecord, _>(file.path())
        .await
        .unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].lag_days, 2);
    let lines: Vec<usize> = warnings.iter().map(Warning::line_number).collect();
    assert_eq!(lines, vec![2, 5]);
    assert!(warnings.iter().all(|w| w.kind() == "malformed_json"));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_jsonl_resilient::<EdgeRecord, _>(dir.path().join("absent.jsonl")).await;

    assert!(matches!(result, Err(Error::Io(_))));
}
