//! Chunk-key scheme.
//!
//! Every flush persists exactly one chunk under a key of the form
//! `[prefix/]<token>[.extension]`, where the token is a nanosecond epoch
//! timestamp zero-padded to a fixed 19-digit width. The padding is what
//! makes lexicographic order equal chronological order: without it, a token
//! that crosses a digit-count boundary would sort before older, shorter
//! tokens.
//!
//! Tokens are strictly monotonic within a process: a process-wide atomic
//! high-water mark guarantees that two keys minted back-to-back never
//! collide, even when the wall clock is coarser than a nanosecond.
//!
//! Key construction performs no I/O and cannot fail.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed digit width of the ordering token.
pub const TOKEN_WIDTH: usize = 19;

static LAST_NANOS: AtomicU64 = AtomicU64::new(0);

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Next ordering token: `max(now, last + 1)`.
fn next_timestamp() -> u64 {
    let now = now_nanos();
    let mut last = LAST_NANOS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_NANOS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// Derive a fresh chunk key.
///
/// An empty `prefix` omits the `prefix/` segment; an empty `extension`
/// omits the `.extension` suffix. A trailing `/` on the prefix is
/// tolerated.
pub fn chunk_key(prefix: &str, extension: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let mut key = String::with_capacity(prefix.len() + TOKEN_WIDTH + extension.len() + 2);
    if !prefix.is_empty() {
        key.push_str(prefix);
        key.push('/');
    }
    key.push_str(&format!("{:019}", next_timestamp()));
    if !extension.is_empty() {
        key.push('.');
        key.push_str(extension);
    }
    key
}

/// Sort keys chronologically: ascending (oldest first) or descending.
///
/// Works on any mix of prefixed and prefix-less keys, since the fixed token
/// width makes plain lexicographic order chronological.
pub fn sort_keys(keys: &mut [String], reverse: bool) {
    keys.sort_unstable();
    if reverse {
        keys.reverse();
    }
}
