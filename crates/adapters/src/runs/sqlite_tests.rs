// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::{tempdir, TempDir};

fn seeded_db(rows: &[(&str, &str)]) -> (TempDir, SqliteRunStore) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("antfarm.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE runs (id INTEGER PRIMARY KEY, workflow_id TEXT NOT NULL, status TEXT NOT NULL);",
    )
    .unwrap();
    for (workflow_id, status) in rows {
        conn.execute(
            "INSERT INTO runs (workflow_id, status) VALUES (?1, ?2)",
            (workflow_id, status),
        )
        .unwrap();
    }
    (dir, SqliteRunStore::new(path))
}

#[tokio::test]
async fn counts_only_running_rows_of_the_workflow() {
    let (_dir, store) = seeded_db(&[
        ("feature-dev", "running"),
        ("feature-dev", "running"),
        ("feature-dev", "completed"),
        ("bugfix", "running"),
    ]);

    assert_eq!(store.count_active_runs("feature-dev").await.unwrap(), 2);
    assert_eq!(store.count_active_runs("bugfix").await.unwrap(), 1);
    assert_eq!(store.count_active_runs("security").await.unwrap(), 0);
}

#[tokio::test]
async fn lists_distinct_running_workflows() {
    let (_dir, store) = seeded_db(&[
        ("feature-dev", "running"),
        ("feature-dev", "running"),
        ("bugfix", "failed"),
        ("audit", "running"),
    ]);

    let ids = store.list_active_workflow_ids().await.unwrap();
    assert_eq!(ids, vec!["audit".to_string(), "feature-dev".to_string()]);
}

#[tokio::test]
async fn missing_database_is_unavailable() {
    let dir = tempdir().unwrap();
    let store = SqliteRunStore::new(dir.path().join("missing.db"));

    let err = store.count_active_runs("w").await.unwrap_err();
    assert!(matches!(err, RunStoreError::Unavailable(_)));
}

#[tokio::test]
async fn missing_table_is_a_query_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE other (x INTEGER);")
        .unwrap();
    let store = SqliteRunStore::new(path);

    let err = store.list_active_workflow_ids().await.unwrap_err();
    assert!(matches!(err, RunStoreError::Query(_)));
}
