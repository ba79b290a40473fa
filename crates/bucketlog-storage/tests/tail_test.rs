//! Integration tests for the file-tail adapter.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use bucketlog_storage::{ChunkStore, Error, FollowOptions, ReadOptions, TailConfig};

fn memory_store() -> Arc<dyn ObjectStore> {
    Arc::new(InMemory::new())
}

async fn list_keys(store: &Arc<dyn ObjectStore>) -> Vec<String> {
    let mut keys = Vec::new();
    let mut listing = store.list(None);
    while let Some(meta) = listing.next().await {
        keys.push(meta.unwrap().location.to_string());
    }
    keys.sort();
    keys
}

fn append(path: &std::path::Path, data: &[u8]) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(data).unwrap();
}

fn tail_config(max_buffer_size: usize) -> TailConfig {
    TailConfig {
        max_buffer_size,
        poll_interval: Duration::from_millis(20),
    }
}

fn spawn_follow(
    chunk_store: &ChunkStore,
    key: &str,
    path: std::path::PathBuf,
    config: TailConfig,
    cancel: &CancellationToken,
) -> tokio::task::JoinHandle<Result<(), Error>> {
    let chunk_store = chunk_store.clone();
    let key = key.to_string();
    let cancel = cancel.clone();
    tokio::spawn(async move {
        chunk_store
            .follow_file(
                FollowOptions {
                    key,
                    path,
                    encoding: String::new(),
                    config,
                },
                cancel,
            )
            .await
    })
}

#[tokio::test]
async fn follow_forwards_threshold_chunks_and_discards_remainder() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, b"earlier line\n").unwrap();

    let cancel = CancellationToken::new();
    let task = spawn_follow(&chunk_store, "tail/1", path.clone(), tail_config(8), &cancel);

    // Let the follower reach the current end of the file.
    tokio::time::sleep(Duration::from_millis(100)).await;

    append(&path, b"first appended line\n");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(list_keys(&store).await.len(), 1);

    // A short trailing line stays under the threshold.
    append(&path, b"x\n");
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    task.await.unwrap().unwrap();

    let mut reader = chunk_store
        .reader(ReadOptions::forward("tail/1"))
        .await
        .unwrap();
    let text = String::from_utf8(reader.read_to_end().await.unwrap()).unwrap();

    assert!(text.contains("first appended line\n"));
    assert!(
        !text.contains("earlier line"),
        "the file is opened at its current end"
    );
    assert!(
        !text.contains("x\n"),
        "the sub-threshold remainder is discarded at shutdown"
    );
}

#[tokio::test]
async fn follow_reopens_after_truncation() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rotating.log");
    std::fs::write(&path, b"").unwrap();

    let cancel = CancellationToken::new();
    let task = spawn_follow(&chunk_store, "tail/2", path.clone(), tail_config(4), &cancel);

    tokio::time::sleep(Duration::from_millis(100)).await;
    append(&path, b"abcdefgh\n");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(list_keys(&store).await.len(), 1);

    // Truncate, give the follower time to notice, then write fresh lines.
    std::fs::write(&path, b"").unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    append(&path, b"post-rotate line\n");
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    task.await.unwrap().unwrap();

    let mut reader = chunk_store
        .reader(ReadOptions::forward("tail/2"))
        .await
        .unwrap();
    let text = String::from_utf8(reader.read_to_end().await.unwrap()).unwrap();
    assert!(text.contains("abcdefgh\n"));
    assert!(text.contains("post-rotate line\n"));
}

#[tokio::test]
async fn follow_validates_options_before_opening() {
    let chunk_store = ChunkStore::new(memory_store());
    let dir = TempDir::new().unwrap();

    let err = chunk_store
        .follow_file(
            FollowOptions {
                key: String::new(),
                path: dir.path().join("app.log"),
                encoding: String::new(),
                config: TailConfig::default(),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn follow_surfaces_missing_file() {
    let chunk_store = ChunkStore::new(memory_store());
    let dir = TempDir::new().unwrap();

    let err = chunk_store
        .follow_file(
            FollowOptions {
                key: "tail/3".to_string(),
                path: dir.path().join("missing.log"),
                encoding: String::new(),
                config: TailConfig::default(),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FollowFile { .. }));
}
