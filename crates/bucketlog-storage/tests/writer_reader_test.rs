//! Integration tests for the buffered write path and the chunk read path.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use serde_json::json;

use bucketlog_encoding::JSON;
use bucketlog_storage::{
    AddMetadataOptions, BucketWriter, ChunkReader, ChunkStore, Encoder, Error, ReadOptions,
    WriteBytesOptions, WriteOptions, WriterConfig, WriterOptions,
};

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

/// Writer with periodic flushing disabled, so tests control every flush.
fn raw_writer(store: &Arc<dyn ObjectStore>, key: &str, max_buffer_size: usize) -> BucketWriter {
    BucketWriter::new(
        store.clone(),
        Encoder::default(),
        WriterOptions {
            key: key.to_string(),
            encoding: String::new(),
            config: WriterConfig {
                max_buffer_size,
                flush_interval: Duration::ZERO,
            },
            local: None,
        },
    )
    .unwrap()
}

#[tokio::test]
async fn append_order_survives_flush_boundaries() {
    let store = memory_store();
    let writer = raw_writer(&store, "task/1", usize::MAX);

    writer.append_bytes("one\n").await.unwrap();
    writer.append_bytes("two\n").await.unwrap();
    writer.flush().await.unwrap();
    writer.append_bytes("three\n").await.unwrap();
    writer.close().await.unwrap();

    let mut reader = ChunkReader::open(store.clone(), "task/1", false)
        .await
        .unwrap();
    assert_eq!(reader.chunk_keys().len(), 2);

    let data = reader.read_to_end().await.unwrap();
    assert_eq!(data, b"one\ntwo\nthree\n");
}

#[tokio::test]
async fn size_threshold_flushes_before_append_returns() {
    let store = memory_store();
    let writer = raw_writer(&store, "task/2", 10);

    // 16 bytes crosses the 10-byte threshold: flushed synchronously.
    writer.append_bytes(vec![b'a'; 16]).await.unwrap();
    assert_eq!(writer.buffered_len().await, 0);
    assert_eq!(list_keys(&store).await.len(), 1);

    // Counter restarts from only the bytes appended after that flush.
    writer.append_bytes("abc").await.unwrap();
    assert_eq!(writer.buffered_size().await, 3);
    assert_eq!(list_keys(&store).await.len(), 1);

    writer.close().await.unwrap();
    assert_eq!(list_keys(&store).await.len(), 2);
}

#[tokio::test]
async fn close_is_idempotent_and_flushes_once() {
    let store = memory_store();
    let writer = raw_writer(&store, "task/3", usize::MAX);

    writer.append_bytes("tail\n").await.unwrap();
    writer.close().await.unwrap();
    assert_eq!(list_keys(&store).await.len(), 1);

    writer.close().await.unwrap();
    assert_eq!(list_keys(&store).await.len(), 1);
}

#[tokio::test]
async fn append_after_close_fails_cleanly() {
    let store = memory_store();
    let writer = raw_writer(&store, "task/4", usize::MAX);

    writer.close().await.unwrap();
    assert!(writer.is_closed().await);

    let err = writer.append_bytes("late\n").await.unwrap_err();
    assert!(matches!(err, Error::ClosedWriter));
    assert_eq!(writer.buffered_len().await, 0);

    // Flush on a closed writer is a no-op success.
    writer.flush().await.unwrap();
    assert_eq!(list_keys(&store).await.len(), 0);
}

#[tokio::test]
async fn reverse_read_yields_newest_first() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    for payload in ["A", "B", "C"] {
        chunk_store
            .write_bytes(WriteBytesOptions {
                key: "logs".to_string(),
                data: Bytes::from(payload),
                encoding: String::new(),
            })
            .await
            .unwrap();
    }

    let mut reader = chunk_store
        .reader(ReadOptions::reverse("logs"))
        .await
        .unwrap();

    let mut pages = Vec::new();
    while let Some(page) = reader.read_page().await.unwrap() {
        pages.push(String::from_utf8(page.to_vec()).unwrap());
    }
    assert_eq!(pages, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn empty_key_is_rejected_before_any_io() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    let err = chunk_store
        .write(WriteOptions {
            key: String::new(),
            data: json!("lost"),
            encoding: JSON.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(list_keys(&store).await.is_empty());
}

#[tokio::test]
async fn unknown_encoding_is_rejected() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    let err = chunk_store
        .write(WriteOptions {
            key: "k".to_string(),
            data: json!("v"),
            encoding: "gob".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
    assert!(list_keys(&store).await.is_empty());
}

#[tokio::test]
async fn structured_buffer_flushes_as_one_json_array() {
    let store = memory_store();
    let writer = BucketWriter::new(
        store.clone(),
        Encoder::default(),
        WriterOptions {
            key: "events".to_string(),
            encoding: JSON.to_string(),
            config: WriterConfig {
                max_buffer_size: usize::MAX,
                flush_interval: Duration::ZERO,
            },
            local: None,
        },
    )
    .unwrap();

    writer.append(&json!({"n": 1})).await.unwrap();
    writer.append("plain").await.unwrap();
    writer.flush().await.unwrap();
    writer.close().await.unwrap();

    let keys = list_keys(&store).await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(".json"));

    let mut reader = ChunkReader::open(store.clone(), "events", false)
        .await
        .unwrap();
    let data = reader.read_to_end().await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["n"], 1);
    assert_eq!(entries[1], "plain");
}

#[tokio::test]
async fn timed_flush_fires_without_size_threshold() {
    let store = memory_store();
    let writer = BucketWriter::new(
        store.clone(),
        Encoder::default(),
        WriterOptions {
            key: "timed".to_string(),
            encoding: String::new(),
            config: WriterConfig {
                max_buffer_size: usize::MAX,
                flush_interval: Duration::from_millis(50),
            },
            local: None,
        },
    )
    .unwrap();

    writer.append_bytes("tick\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(list_keys(&store).await.len(), 1);
    assert_eq!(writer.buffered_len().await, 0);

    writer.close().await.unwrap();
    assert_eq!(list_keys(&store).await.len(), 1);
}

#[tokio::test]
async fn missing_chunk_aborts_the_read() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    for payload in ["first", "second"] {
        chunk_store
            .write_bytes(WriteBytesOptions {
                key: "gap".to_string(),
                data: Bytes::from(payload),
                encoding: String::new(),
            })
            .await
            .unwrap();
    }

    let mut reader = chunk_store
        .reader(ReadOptions::forward("gap"))
        .await
        .unwrap();
    let first = reader.chunk_keys()[0].clone();
    store
        .delete(&object_store::path::Path::from(first.as_str()))
        .await
        .unwrap();

    let err = reader.read_page().await.unwrap_err();
    assert!(matches!(err, Error::ChunkFetch { .. }));
}

#[tokio::test]
async fn metadata_object_is_not_part_of_the_stream() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    chunk_store
        .add_metadata(AddMetadataOptions {
            key: "task/9".to_string(),
            data: json!({"run": 9}),
            encoding: JSON.to_string(),
        })
        .await
        .unwrap();
    chunk_store
        .write_bytes(WriteBytesOptions {
            key: "task/9".to_string(),
            data: Bytes::from("data\n"),
            encoding: String::new(),
        })
        .await
        .unwrap();

    let mut reader = chunk_store
        .reader(ReadOptions::forward("task/9"))
        .await
        .unwrap();
    assert_eq!(reader.chunk_keys().len(), 1);
    assert_eq!(reader.read_to_end().await.unwrap(), b"data\n");

    // The metadata object itself is still in the bucket.
    let keys = list_keys(&store).await;
    assert!(keys.iter().any(|k| k.ends_with("metadata.json")));
}

#[tokio::test]
async fn readers_are_isolated_by_prefix() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    for (key, payload) in [("task/a", "alpha\n"), ("task/b", "beta\n")] {
        chunk_store
            .write_bytes(WriteBytesOptions {
                key: key.to_string(),
                data: Bytes::from(payload),
                encoding: String::new(),
            })
            .await
            .unwrap();
    }

    let mut reader = chunk_store
        .reader(ReadOptions::forward("task/a"))
        .await
        .unwrap();
    assert_eq!(reader.chunk_keys().len(), 1);
    assert_eq!(reader.read_to_end().await.unwrap(), b"alpha\n");
}

#[tokio::test]
async fn read_fills_caller_buffer_across_chunks() {
    let store = memory_store();
    let chunk_store = ChunkStore::new(store.clone());

    for payload in ["abcd", "efgh"] {
        chunk_store
            .write_bytes(WriteBytesOptions {
                key: "fill".to_string(),
                data: Bytes::from(payload),
                encoding: String::new(),
            })
            .await
            .unwrap();
    }

    let mut reader = chunk_store
        .reader(ReadOptions::forward("fill"))
        .await
        .unwrap();

    // One read spans the chunk boundary.
    let mut buf = [0u8; 6];
    assert_eq!(reader.read(&mut buf).await.unwrap(), 6);
    assert_eq!(&buf, b"abcdef");

    // The rest, then the end-of-stream signal.
    assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
    assert_eq!(&buf[..2], b"gh");
    assert_eq!(reader.read(&mut buf).await.unwrap(), 0);

    reader.close();
    reader.close();
}
