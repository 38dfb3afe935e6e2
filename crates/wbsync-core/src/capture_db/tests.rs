//! Tests for capture_db (in-memory database).

use super::{CaptureDb, CaptureRecord};

fn record(file_name: &str, timestamp: &str, digest: &str, size: i64) -> CaptureRecord {
    CaptureRecord {
        directory: "files/example.com/a.pdf".to_string(),
        file_name: file_name.to_string(),
        resource_url: "https://example.com/a.pdf".to_string(),
        timestamp: timestamp.to_string(),
        live: false,
        digest: digest.to_string(),
        size,
        saved_at: 0,
    }
}

#[tokio::test]
async fn find_by_digest_returns_first_saved() {
    let db = CaptureDb::open_memory().await.unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "aa", 3))
        .await
        .unwrap();
    db.record(&record("20200601000000_a.pdf", "20200601000000", "bb", 4))
        .await
        .unwrap();

    let hit = db
        .find_by_digest("files/example.com/a.pdf", "aa")
        .await
        .unwrap()
        .expect("digest recorded");
    assert_eq!(hit.file_name, "20200101000000_a.pdf");
    assert!(hit.saved_at > 0);

    assert!(db
        .find_by_digest("files/example.com/a.pdf", "cc")
        .await
        .unwrap()
        .is_none());
    assert!(db
        .find_by_digest("files/other", "aa")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn record_replaces_same_file_name() {
    let db = CaptureDb::open_memory().await.unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "aa", 3))
        .await
        .unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "bb", 5))
        .await
        .unwrap();
    let rows = db.list_directory("files/example.com/a.pdf").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].digest, "bb");
    assert_eq!(rows[0].size, 5);
}

#[tokio::test]
async fn summaries_count_shared_content_once() {
    let db = CaptureDb::open_memory().await.unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "aa", 10))
        .await
        .unwrap();
    db.record(&record("20200601000000_a.pdf", "20200601000000", "aa", 10))
        .await
        .unwrap();
    let mut live = record("20261018100000live_a.pdf", "20261018100000", "bb", 7);
    live.live = true;
    db.record(&live).await.unwrap();

    let summaries = db.summaries().await.unwrap();
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.files, 3);
    assert_eq!(s.live_files, 1);
    assert_eq!(s.distinct_digests, 2);
    assert_eq!(s.stored_bytes, 17);
    assert_eq!(s.resource_url, "https://example.com/a.pdf");
}

#[tokio::test]
async fn forget_removes_row() {
    let db = CaptureDb::open_memory().await.unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "aa", 3))
        .await
        .unwrap();
    assert_eq!(
        db.forget("files/example.com/a.pdf", "20200101000000_a.pdf")
            .await
            .unwrap(),
        1
    );
    assert!(db.list_directory("files/example.com/a.pdf").await.unwrap().is_empty());
}

#[tokio::test]
async fn open_at_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("captures.db");
    let db = CaptureDb::open_at(&path).await.unwrap();
    db.record(&record("20200101000000_a.pdf", "20200101000000", "aa", 3))
        .await
        .unwrap();
    assert!(path.exists());
}
