//! The durable request queue: an append-only record log plus an ack cursor.
//!
//! # On-disk layout
//!
//! For an identity `{client}[-testing].{host}-{port}.{user}.v1` the queue
//! owns three files in its directory:
//!
//! ```text
//! <stem>.jsonl  - record log, one JSON object per line
//! <stem>.ack    - cursor: highest acknowledged sequence number
//! <stem>.lock   - OS advisory lock guarding single-consumer access
//! ```
//!
//! Records carry monotonically increasing sequence numbers. The log is
//! crash-safe because complete lines are always valid JSON: a partial
//! trailing line from a crash mid-append is detected on open and truncated,
//! and a non-monotonic sequence number is treated as corruption and truncated
//! likewise.
//!
//! # Consumer protocol
//!
//! Exactly one consumer repeatedly calls [`DurableQueue::peek`] and, once the
//! network POST for the peeked item succeeded, [`DurableQueue::ack`].
//! Repeated `peek` calls before `ack` return the same item: the protocol is
//! "retry the same item", not "pop and requeue on failure". The cursor file
//! is written atomically (temp file, rename, directory fsync), so after a
//! crash the queue resumes at the oldest unacknowledged record.
//!
//! When the queue fully drains, the log is truncated and the cursor removed
//! so the file does not grow without bound.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::fsync::{fsync_dir, fsync_file};
use crate::types::{BucketId, Event};

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Only heartbeat endpoints may be queued.
    #[error("refusing to queue non-heartbeat endpoint: {endpoint}")]
    NotHeartbeat { endpoint: String },

    /// `ack()` called without a preceding successful `peek()`.
    #[error("ack() without a preceding successful peek()")]
    AckWithoutPeek,

    /// Another process holds this queue open.
    #[error("queue already locked by another process: {path}")]
    Locked { path: PathBuf },

    /// An identity component would produce an unsafe filename.
    #[error("invalid queue identity {component}: {value:?}")]
    InvalidIdentity {
        component: &'static str,
        value: String,
    },
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// A request waiting for delivery to the collector.
///
/// `endpoint` is relative to the API root (e.g.
/// `buckets/my-watcher_host/heartbeat?pulsetime=11`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub endpoint: String,
    pub payload: Value,
}

impl QueuedRequest {
    /// Builds the queued form of a heartbeat POST for `bucket_id`.
    pub fn heartbeat(bucket_id: &BucketId, pulsetime: f64, event: &Event) -> Result<Self> {
        Ok(QueuedRequest {
            endpoint: format!("buckets/{}/heartbeat?pulsetime={}", bucket_id, pulsetime),
            payload: serde_json::to_value(event)?,
        })
    }

    /// True if the endpoint references a heartbeat route.
    pub fn is_heartbeat(&self) -> bool {
        self.endpoint.contains("/heartbeat")
    }
}

/// One line of the record log.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueRecord {
    seq: u64,
    #[serde(flatten)]
    request: QueuedRequest,
}

/// The persistent ack cursor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct AckCursor {
    acked: u64,
}

/// Identity scoping a queue to one (client, server, user) tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueIdentity {
    pub client_name: String,
    pub testing: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl QueueIdentity {
    /// Bump whenever the record or cursor format changes; old queues are then
    /// left untouched under their old filenames instead of being misread.
    pub const FORMAT_VERSION: u32 = 1;

    /// The shared filename stem for this identity's log, cursor and lock.
    pub fn file_stem(&self) -> Result<String> {
        for (component, value) in [
            ("client_name", &self.client_name),
            ("host", &self.host),
            ("user", &self.user),
        ] {
            if value.is_empty()
                || value.contains(['/', '\\', '\0'])
                || value.starts_with('.')
            {
                return Err(QueueError::InvalidIdentity {
                    component,
                    value: value.clone(),
                });
            }
        }

        Ok(format!(
            "{}{}.{}-{}.{}.v{}",
            self.client_name,
            if self.testing { "-testing" } else { "" },
            self.host,
            self.port,
            self.user,
            Self::FORMAT_VERSION,
        ))
    }
}

/// A crash-safe FIFO queue of [`QueuedRequest`]s.
///
/// Producers enqueue and the single consumer peeks/acks through the same
/// handle; the owner serializes access (the client facade wraps the queue in
/// a mutex shared between producer calls and the delivery worker).
pub struct DurableQueue {
    dir: PathBuf,
    log: File,
    log_path: PathBuf,
    cursor_path: PathBuf,
    entries: VecDeque<QueueRecord>,
    next_seq: u64,
    peeked: bool,
    /// Held for the queue's lifetime; the OS releases it on process exit or
    /// crash.
    _lock: File,
}

impl DurableQueue {
    /// Opens (or creates) the queue for `identity` under `dir`.
    ///
    /// Replays the record log, truncating any partial trailing line or
    /// non-monotonic corruption, and drops records at or below the persisted
    /// ack cursor. If everything on disk is already acknowledged, the log is
    /// compacted immediately.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Locked`] if another process has this queue open,
    /// [`QueueError::InvalidIdentity`] for unsafe identity components, and
    /// [`QueueError::Io`] for filesystem errors.
    pub fn open(dir: impl Into<PathBuf>, identity: &QueueIdentity) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let stem = identity.file_stem()?;
        let log_path = dir.join(format!("{stem}.jsonl"));
        let cursor_path = dir.join(format!("{stem}.ack"));
        let lock_path = dir.join(format!("{stem}.lock"));

        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        match lock.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(QueueError::Locked { path: lock_path });
            }
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }

        let acked = read_cursor(&cursor_path);
        let (entries, next_seq) = replay_log(&log_path, acked)?;

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        fsync_dir(&dir)?;

        let mut queue = DurableQueue {
            dir,
            log,
            log_path,
            cursor_path,
            entries,
            next_seq,
            peeked: false,
            _lock: lock,
        };

        // Everything on disk already delivered: start from a clean file.
        if queue.entries.is_empty() && queue.log_len()? > 0 {
            queue.compact()?;
        }

        Ok(queue)
    }

    /// Appends a request to the queue, durably.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotHeartbeat`] for non-heartbeat endpoints; the
    /// facade only routes heartbeats here, but the guard does not rely on
    /// trust.
    pub fn enqueue(&mut self, request: QueuedRequest) -> Result<()> {
        if !request.is_heartbeat() {
            return Err(QueueError::NotHeartbeat {
                endpoint: request.endpoint,
            });
        }

        let record = QueueRecord {
            seq: self.next_seq,
            request,
        };
        let json = serde_json::to_string(&record)?;
        writeln!(self.log, "{}", json)?;
        fsync_file(&self.log)?;

        self.next_seq += 1;
        self.entries.push_back(record);
        Ok(())
    }

    /// Returns the oldest unacknowledged request without removing it.
    ///
    /// Repeated calls before [`DurableQueue::ack`] return the same item.
    pub fn peek(&mut self) -> Option<&QueuedRequest> {
        match self.entries.front() {
            Some(record) => {
                self.peeked = true;
                Some(&record.request)
            }
            None => {
                self.peeked = false;
                None
            }
        }
    }

    /// Permanently removes the item returned by the last [`DurableQueue::peek`].
    ///
    /// Call only after the POST for that item has succeeded (or the item has
    /// been classified as permanently undeliverable). The cursor hits disk
    /// before this returns; a crash immediately before this call re-delivers
    /// exactly the peeked item on the next run.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AckWithoutPeek`] if no successful `peek()`
    /// precedes this call.
    pub fn ack(&mut self) -> Result<()> {
        if !self.peeked {
            return Err(QueueError::AckWithoutPeek);
        }
        let Some(record) = self.entries.pop_front() else {
            return Err(QueueError::AckWithoutPeek);
        };
        self.peeked = false;

        if self.entries.is_empty() {
            self.compact()
        } else {
            self.write_cursor(record.seq)
        }
    }

    /// Empties the queue and clears any pending peek.
    ///
    /// Used when buckets are re-registered from scratch and previously queued
    /// heartbeats no longer apply.
    pub fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        self.peeked = false;
        self.compact()
    }

    /// Number of unacknowledged items. Diagnostics only.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Path of the record log (diagnostics and tests).
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn log_len(&self) -> io::Result<u64> {
        Ok(self.log.metadata()?.len())
    }

    /// Truncates the log and removes the cursor. Sequence numbering restarts.
    ///
    /// Ordering matters for crash-safety: the log is emptied before the
    /// cursor is removed, so a crash in between leaves an empty log with a
    /// stale cursor, which is harmless and cleaned up on the next open.
    fn compact(&mut self) -> Result<()> {
        self.log.set_len(0)?;
        fsync_file(&self.log)?;

        if self.cursor_path.exists() {
            std::fs::remove_file(&self.cursor_path)?;
            fsync_dir(&self.dir)?;
        }

        self.next_seq = 1;
        Ok(())
    }

    /// Persists the ack cursor atomically: temp file, fsync, rename, dir fsync.
    fn write_cursor(&self, acked: u64) -> Result<()> {
        let tmp_path = self.cursor_path.with_extension("ack.tmp");
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            let json = serde_json::to_string(&AckCursor { acked })?;
            tmp.write_all(json.as_bytes())?;
            fsync_file(&tmp)?;
        }
        std::fs::rename(&tmp_path, &self.cursor_path)?;
        fsync_dir(&self.dir)?;
        Ok(())
    }
}

/// Reads the persisted ack cursor, treating a missing or unreadable cursor
/// as "nothing acknowledged". Losing the cursor only causes re-delivery,
/// which the at-least-once contract permits.
fn read_cursor(path: &Path) -> u64 {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AckCursor>(&contents) {
            Ok(cursor) => cursor.acked,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable ack cursor, re-delivering from log start");
                0
            }
        },
        Err(_) => 0,
    }
}

/// Replays the record log, truncating a partial trailing line or
/// non-monotonic corruption, and returns the records with `seq > acked`
/// together with the next sequence number to assign.
fn replay_log(path: &Path, acked: u64) -> Result<(VecDeque<QueueRecord>, u64)> {
    if !path.exists() {
        return Ok((VecDeque::new(), acked + 1));
    }

    let file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(0))?;

    let mut entries = VecDeque::new();
    let mut last_valid_pos = 0u64;
    let mut current_pos = 0u64;
    let mut max_seq: Option<u64> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let line_start = current_pos;
        current_pos += bytes_read as u64;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            last_valid_pos = current_pos;
            continue;
        }

        match serde_json::from_str::<QueueRecord>(trimmed) {
            Ok(record) => {
                if max_seq.is_some_and(|prev| record.seq <= prev) {
                    // Non-monotonic sequence: corruption. Keep the valid prefix.
                    last_valid_pos = line_start;
                    break;
                }
                max_seq = Some(record.seq);
                if record.seq > acked {
                    entries.push_back(record);
                }
                last_valid_pos = current_pos;
            }
            Err(_) => {
                // Partial line from a crash mid-append.
                last_valid_pos = line_start;
                break;
            }
        }
    }

    if last_valid_pos < file_len {
        warn!(
            path = %path.display(),
            truncated_bytes = file_len - last_valid_pos,
            "truncating corrupt tail of queue log"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(last_valid_pos)?;
        fsync_file(&file)?;
    }

    let next_seq = max_seq.map(|s| s + 1).unwrap_or(acked + 1);
    Ok((entries, next_seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn identity() -> QueueIdentity {
        QueueIdentity {
            client_name: "test-watcher".to_string(),
            testing: false,
            host: "127.0.0.1".to_string(),
            port: 7600,
            user: "alice".to_string(),
        }
    }

    fn heartbeat_request(n: u64) -> QueuedRequest {
        QueuedRequest::heartbeat(
            &BucketId::new("bucket"),
            60.0,
            &event(n as f64, 1.0, &[("n", &n.to_string())]),
        )
        .unwrap()
    }

    // ─── Basic operations ───

    #[test]
    fn enqueue_peek_ack_fifo() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();

        for n in 0..3 {
            queue.enqueue(heartbeat_request(n)).unwrap();
        }
        assert_eq!(queue.size(), 3);

        for n in 0..3 {
            let peeked = queue.peek().unwrap().clone();
            assert_eq!(peeked, heartbeat_request(n));
            queue.ack().unwrap();
        }
        assert!(queue.peek().is_none());
    }

    #[test]
    fn peek_is_stable_until_ack() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        queue.enqueue(heartbeat_request(0)).unwrap();
        queue.enqueue(heartbeat_request(1)).unwrap();

        let first = queue.peek().unwrap().clone();
        let again = queue.peek().unwrap().clone();
        assert_eq!(first, again);

        queue.ack().unwrap();
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(1));
    }

    #[test]
    fn ack_without_peek_errors() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        queue.enqueue(heartbeat_request(0)).unwrap();

        assert!(matches!(queue.ack(), Err(QueueError::AckWithoutPeek)));

        // An empty peek does not authorize an ack either.
        queue.peek().unwrap();
        queue.ack().unwrap();
        assert!(queue.peek().is_none());
        assert!(matches!(queue.ack(), Err(QueueError::AckWithoutPeek)));
    }

    #[test]
    fn rejects_non_heartbeat_endpoint() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();

        let request = QueuedRequest {
            endpoint: "buckets/b/events".to_string(),
            payload: serde_json::json!({}),
        };
        assert!(matches!(
            queue.enqueue(request),
            Err(QueueError::NotHeartbeat { .. })
        ));
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn reset_empties_queue_and_clears_peek() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        queue.enqueue(heartbeat_request(0)).unwrap();
        queue.peek().unwrap();

        queue.reset().unwrap();
        assert_eq!(queue.size(), 0);
        assert!(matches!(queue.ack(), Err(QueueError::AckWithoutPeek)));
    }

    // ─── Durability across restarts ───

    #[test]
    fn queue_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            for n in 0..5 {
                queue.enqueue(heartbeat_request(n)).unwrap();
            }
        }

        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 5);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(0));
    }

    /// Crash between POST success and ack: the item is re-delivered exactly
    /// once (at-least-once, not at-most-once).
    #[test]
    fn crash_before_ack_redelivers_exactly_one() {
        let dir = tempdir().unwrap();
        {
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            queue.enqueue(heartbeat_request(0)).unwrap();
            queue.enqueue(heartbeat_request(1)).unwrap();

            // POST for item 0 succeeded ... crash before ack().
            queue.peek().unwrap();
        }

        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(0));
        queue.ack().unwrap();

        // After a persisted ack, a restart does not resurrect the item.
        drop(queue);
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(1));
    }

    #[test]
    fn draining_compacts_log_and_removes_cursor() {
        let dir = tempdir().unwrap();
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        for n in 0..4 {
            queue.enqueue(heartbeat_request(n)).unwrap();
        }
        for _ in 0..4 {
            queue.peek().unwrap();
            queue.ack().unwrap();
        }

        assert_eq!(std::fs::metadata(queue.log_path()).unwrap().len(), 0);
        let cursor_path = queue.log_path().with_extension("ack");
        assert!(!cursor_path.exists());

        // Enqueueing after compaction works and survives a reopen.
        queue.enqueue(heartbeat_request(9)).unwrap();
        drop(queue);
        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(9));
    }

    #[test]
    fn partial_trailing_line_is_truncated() {
        let dir = tempdir().unwrap();
        let log_path;
        {
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            queue.enqueue(heartbeat_request(0)).unwrap();
            queue.enqueue(heartbeat_request(1)).unwrap();
            log_path = queue.log_path().to_path_buf();
        }

        // Crash mid-append: partial JSON on the final line.
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        write!(file, r#"{{"seq":3,"endpoint":"buck"#).unwrap();
        drop(file);

        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(0));

        // New appends land after the truncated tail and replay cleanly.
        queue.enqueue(heartbeat_request(2)).unwrap();
        drop(queue);
        let queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 3);
    }

    #[test]
    fn non_monotonic_sequence_truncates_as_corruption() {
        let dir = tempdir().unwrap();
        let log_path;
        {
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            queue.enqueue(heartbeat_request(0)).unwrap();
            queue.enqueue(heartbeat_request(1)).unwrap();
            log_path = queue.log_path().to_path_buf();
        }

        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        writeln!(
            file,
            r#"{{"seq":1,"endpoint":"buckets/b/heartbeat?pulsetime=1","payload":{{}}}}"#
        )
        .unwrap();
        drop(file);

        let queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        assert_eq!(queue.size(), 2);
    }

    #[test]
    fn unreadable_cursor_redelivers_from_log_start() {
        let dir = tempdir().unwrap();
        let cursor_path;
        {
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            queue.enqueue(heartbeat_request(0)).unwrap();
            queue.enqueue(heartbeat_request(1)).unwrap();
            queue.peek().unwrap();
            queue.ack().unwrap();
            cursor_path = queue.log_path().with_extension("ack");
        }

        std::fs::write(&cursor_path, b"not json").unwrap();

        let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        // Item 0 comes back: re-delivery, never loss.
        assert_eq!(queue.size(), 2);
        assert_eq!(queue.peek().unwrap().clone(), heartbeat_request(0));
    }

    // ─── Locking and identity ───

    #[test]
    fn second_open_fails_while_locked() {
        let dir = tempdir().unwrap();
        let _queue = DurableQueue::open(dir.path(), &identity()).unwrap();

        let result = DurableQueue::open(dir.path(), &identity());
        assert!(matches!(result, Err(QueueError::Locked { .. })));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempdir().unwrap();
        {
            let _queue = DurableQueue::open(dir.path(), &identity()).unwrap();
        }
        assert!(DurableQueue::open(dir.path(), &identity()).is_ok());
    }

    #[test]
    fn different_identities_do_not_collide() {
        let dir = tempdir().unwrap();
        let mut first = DurableQueue::open(dir.path(), &identity()).unwrap();

        let other = QueueIdentity {
            user: "bob".to_string(),
            ..identity()
        };
        let mut second = DurableQueue::open(dir.path(), &other).unwrap();

        first.enqueue(heartbeat_request(0)).unwrap();
        assert_eq!(second.size(), 0);
        second.enqueue(heartbeat_request(1)).unwrap();
        assert_eq!(first.size(), 1);
    }

    #[test]
    fn identity_stem_includes_version_and_testing_marker() {
        let stem = identity().file_stem().unwrap();
        assert_eq!(stem, "test-watcher.127.0.0.1-7600.alice.v1");

        let testing = QueueIdentity {
            testing: true,
            ..identity()
        };
        assert_eq!(
            testing.file_stem().unwrap(),
            "test-watcher-testing.127.0.0.1-7600.alice.v1"
        );
    }

    #[test]
    fn identity_rejects_path_separators() {
        for bad in ["../../etc", "a/b", "a\\b", "", ".hidden"] {
            let id = QueueIdentity {
                user: bad.to_string(),
                ..identity()
            };
            assert!(
                matches!(id.file_stem(), Err(QueueError::InvalidIdentity { .. })),
                "accepted unsafe user {:?}",
                bad
            );
        }
    }

    // ─── Properties ───

    proptest! {
        /// FIFO order survives any split of acks before a restart.
        #[test]
        fn order_preserved_across_reopen(
            total in 1usize..20,
            acks in 0usize..20,
        ) {
            let acks = acks.min(total);
            let dir = tempdir().unwrap();

            {
                let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
                for n in 0..total {
                    queue.enqueue(heartbeat_request(n as u64)).unwrap();
                }
                for _ in 0..acks {
                    queue.peek().unwrap();
                    queue.ack().unwrap();
                }
            }

            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();
            prop_assert_eq!(queue.size(), total - acks);
            for n in acks..total {
                let peeked = queue.peek().unwrap().clone();
                prop_assert_eq!(peeked, heartbeat_request(n as u64));
                queue.ack().unwrap();
            }
            prop_assert!(queue.peek().is_none());
        }

        /// Size always reflects enqueues minus acks.
        #[test]
        fn size_tracks_operations(
            enqueues in 0usize..15,
            acks in 0usize..15,
        ) {
            let dir = tempdir().unwrap();
            let mut queue = DurableQueue::open(dir.path(), &identity()).unwrap();

            for n in 0..enqueues {
                queue.enqueue(heartbeat_request(n as u64)).unwrap();
            }
            let possible = acks.min(enqueues);
            for _ in 0..possible {
                queue.peek().unwrap();
                queue.ack().unwrap();
            }
            prop_assert_eq!(queue.size(), enqueues - possible);
        }
    }
}
