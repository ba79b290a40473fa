//! File-tail adapter.
//!
//! Follows a growing local file and forwards its lines to chunk storage:
//! open at the current end, poll for appended lines, accumulate them, and
//! once the accumulated size meets the configured threshold, write the
//! buffer as one raw chunk.
//!
//! Rotation and truncation are handled by reopening: a read error or a
//! file that shrinks below the follow cursor reopens from the start.
//!
//! Cancellation stops the loop and discards any sub-threshold remainder -
//! an accepted data-loss edge at shutdown, asserted explicitly in the
//! integration tests. Forwarding errors are logged and counted but do not
//! stop the loop; the last one is returned once the loop ends.

use std::io::SeekFrom;
use std::path::Path as FsPath;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::store::{ChunkStore, FollowOptions, WriteBytesOptions};

pub(crate) async fn follow(
    store: &ChunkStore,
    options: &FollowOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let (mut reader, mut pos) = open_follow(&options.path, true)
        .await
        .map_err(|e| follow_error(&options.path, e))?;

    let mut buffer: Vec<u8> = Vec::new();
    let mut scratch: Vec<u8> = Vec::new();
    let mut failures = 0usize;
    let mut last_error: Option<Error> = None;

    tracing::debug!(
        key = %options.key,
        path = %options.path.display(),
        "following file"
    );

    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut scratch) => read,
        };

        match read {
            // Caught up: check for rotation/truncation, then wait for data.
            Ok(0) => {
                match tokio::fs::metadata(&options.path).await {
                    Ok(meta) if meta.len() < pos => {
                        tracing::debug!(
                            path = %options.path.display(),
                            "file shrank below follow cursor, reopening from start"
                        );
                        match open_follow(&options.path, false).await {
                            Ok((r, p)) => (reader, pos) = (r, p),
                            Err(err) => {
                                tracing::warn!(
                                    path = %options.path.display(),
                                    error = %err,
                                    "reopen after truncation failed"
                                );
                            }
                        }
                    }
                    // Missing file: rotation in progress, keep polling.
                    _ => {}
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(options.config.poll_interval) => {}
                }
            }
            Ok(n) => {
                pos += n as u64;
                buffer.append(&mut scratch);

                if buffer.len() >= options.config.max_buffer_size {
                    let data = Bytes::from(std::mem::take(&mut buffer));
                    let write = store
                        .write_bytes(WriteBytesOptions {
                            key: options.key.clone(),
                            data,
                            encoding: options.encoding.clone(),
                        })
                        .await;
                    if let Err(err) = write {
                        failures += 1;
                        tracing::warn!(
                            key = %options.key,
                            error = %err,
                            "forwarding tailed lines failed"
                        );
                        last_error = Some(err);
                    }
                }
            }
            Err(err) => {
                tracing::debug!(
                    path = %options.path.display(),
                    error = %err,
                    "tail read failed, reopening"
                );
                scratch.clear();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(options.config.poll_interval) => {}
                }
                if let Ok((r, p)) = open_follow(&options.path, false).await {
                    (reader, pos) = (r, p);
                }
            }
        }
    }

    if !buffer.is_empty() {
        tracing::debug!(
            key = %options.key,
            discarded = buffer.len(),
            "follow cancelled, discarding sub-threshold buffer"
        );
    }

    match last_error {
        Some(err) => {
            tracing::warn!(key = %options.key, failures, "file follow finished with forwarding failures");
            Err(err)
        }
        None => Ok(()),
    }
}

async fn open_follow(path: &FsPath, from_end: bool) -> std::io::Result<(BufReader<File>, u64)> {
    let mut file = File::open(path).await?;
    let pos = if from_end {
        file.seek(SeekFrom::End(0)).await?
    } else {
        0
    };
    Ok((BufReader::new(file), pos))
}

fn follow_error(path: &FsPath, source: std::io::Error) -> Error {
    Error::FollowFile {
        path: path.display().to_string(),
        source,
    }
}
