//! Per-user calculation history
//!
//! [`HistorySink`] is the seam the session writes committed results through.
//! [`HistoryStore`] is the local implementation: bounded per user, newest
//! first, optionally persisted to a JSON file that is rewritten on every
//! change.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::core::format_number;

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors raised by a history sink
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading or writing the history file failed
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The history file is not valid JSON
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink is no longer accepting writes
    #[error("history sink closed")]
    Closed,
}

/// A single committed calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Expression text, e.g. `"2 + 3"`
    pub expression: String,
    /// Result of the calculation
    pub result: f64,
    /// When the record was stored; `None` until the store assigns one
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    /// Creates a record stamped with the current time
    #[must_use]
    pub fn new(expression: impl Into<String>, result: f64) -> Self {
        Self {
            expression: expression.into(),
            result,
            timestamp: Some(Utc::now()),
        }
    }

    /// Creates a record with a specific timestamp (for testing)
    #[must_use]
    pub fn with_timestamp(
        expression: impl Into<String>,
        result: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            expression: expression.into(),
            result,
            timestamp,
        }
    }

    /// Result line, e.g. `"= 5"`
    #[must_use]
    pub fn result_label(&self) -> String {
        format!("= {}", format_number(self.result))
    }

    /// Local time of the record, or `"Just now"` before one was assigned
    #[must_use]
    pub fn time_label(&self) -> String {
        self.timestamp.map_or_else(
            || "Just now".to_string(),
            |ts| {
                ts.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            },
        )
    }
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expression, self.result_label())
    }
}

/// Destination for committed calculations
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Stores a calculation for `user_id`
    async fn record(&self, user_id: &str, expression: &str, result: f64) -> HistoryResult<()>;

    /// Streams the user's history, newest first
    ///
    /// The first item is the current snapshot; a new snapshot follows every
    /// change to the store.
    fn subscribe(&self, user_id: &str) -> BoxStream<'static, Vec<HistoryRecord>>;

    /// Deletes every record of `user_id`, returning how many were removed
    async fn clear_all(&self, user_id: &str) -> HistoryResult<usize>;
}

type Records = HashMap<String, VecDeque<HistoryRecord>>;

#[derive(Debug)]
struct StoreInner {
    records: Mutex<Records>,
    capacity: usize,
    path: Option<PathBuf>,
    version: watch::Sender<u64>,
}

/// Local history store
///
/// Cloning is cheap; clones share the same records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    inner: Arc<StoreInner>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory(Self::DEFAULT_CAPACITY)
    }
}

impl HistoryStore {
    /// Default number of records kept per user
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Creates an empty store that is never written to disk
    #[must_use]
    pub fn in_memory(capacity: usize) -> Self {
        Self::from_records(Records::new(), capacity, None)
    }

    /// Opens a store backed by a JSON file
    ///
    /// A missing file starts an empty history.
    pub async fn open(path: impl AsRef<Path>, capacity: usize) -> HistoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Records::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), users = records.len(), "history loaded");
        Ok(Self::from_records(records, capacity, Some(path)))
    }

    fn from_records(mut records: Records, capacity: usize, path: Option<PathBuf>) -> Self {
        let capacity = capacity.max(1);
        for entries in records.values_mut() {
            while entries.len() > capacity {
                entries.pop_front();
            }
        }
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                records: Mutex::new(records),
                capacity,
                path,
                version,
            }),
        }
    }

    /// Maximum number of records kept per user
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Returns the user's records, newest first
    pub async fn snapshot(&self, user_id: &str) -> Vec<HistoryRecord> {
        let records = self.inner.records.lock().await;
        records
            .get(user_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Stores an already built record
    ///
    /// Memory only changes once the file write succeeded.
    pub async fn push(&self, user_id: &str, record: HistoryRecord) -> HistoryResult<()> {
        let mut records = self.inner.records.lock().await;
        let mut entries = records.get(user_id).cloned().unwrap_or_default();
        if entries.len() >= self.inner.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
        self.persist_with(&records, user_id, Some(&entries)).await?;
        records.insert(user_id.to_string(), entries);
        drop(records);
        self.bump_version();
        Ok(())
    }

    /// Writes `records` with `user_id`'s entries replaced by `entries`
    async fn persist_with(
        &self,
        records: &Records,
        user_id: &str,
        entries: Option<&VecDeque<HistoryRecord>>,
    ) -> HistoryResult<()> {
        if self.inner.path.is_none() {
            return Ok(());
        }
        let mut next = records.clone();
        match entries {
            Some(entries) => next.insert(user_id.to_string(), entries.clone()),
            None => next.remove(user_id),
        };
        self.persist(&next).await
    }

    async fn persist(&self, records: &Records) -> HistoryResult<()> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    fn bump_version(&self) {
        self.inner.version.send_modify(|v| *v += 1);
    }
}

#[async_trait]
impl HistorySink for HistoryStore {
    async fn record(&self, user_id: &str, expression: &str, result: f64) -> HistoryResult<()> {
        debug!(user_id, expression, result, "recording calculation");
        self.push(user_id, HistoryRecord::new(expression, result))
            .await
    }

    fn subscribe(&self, user_id: &str) -> BoxStream<'static, Vec<HistoryRecord>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let rx = self.inner.version.subscribe();
        stream::unfold(
            (store, user_id, rx, true),
            |(store, user_id, mut rx, first)| async move {
                if !first && rx.changed().await.is_err() {
                    return None;
                }
                rx.borrow_and_update();
                let snapshot = store.snapshot(&user_id).await;
                Some((snapshot, (store, user_id, rx, false)))
            },
        )
        .boxed()
    }

    async fn clear_all(&self, user_id: &str) -> HistoryResult<usize> {
        let mut records = self.inner.records.lock().await;
        let removed = records.get(user_id).map_or(0, VecDeque::len);
        if removed > 0 {
            self.persist_with(&records, user_id, None).await?;
            records.remove(user_id);
        }
        drop(records);
        if removed > 0 {
            self.bump_version();
        }
        debug!(user_id, removed, "history cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    // ===== HistoryRecord =====

    #[test]
    fn test_record_new_has_timestamp() {
        let record = HistoryRecord::new("2 + 2", 4.0);
        assert_eq!(record.expression, "2 + 2");
        assert_eq!(record.result, 4.0);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_record_display() {
        let record = HistoryRecord::with_timestamp("0.1 + 0.2", 0.3, None);
        assert_eq!(record.to_string(), "0.1 + 0.2 = 0.3");
        assert_eq!(record.result_label(), "= 0.3");
    }

    #[test]
    fn test_record_time_label_pending() {
        let record = HistoryRecord::with_timestamp("1 + 1", 2.0, None);
        assert_eq!(record.time_label(), "Just now");
    }

    #[test]
    fn test_record_time_label_formatted() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let record = HistoryRecord::with_timestamp("1 + 1", 2.0, Some(ts));
        let expected = ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(record.time_label(), expected);
    }

    #[test]
    fn test_record_deserialize_without_timestamp() {
        let json = r#"{"expression":"10 ÷ 2","result":5.0}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.expression, "10 ÷ 2");
        assert!(record.timestamp.is_none());
    }

    // ===== HistoryStore =====

    #[tokio::test]
    async fn test_store_newest_first() {
        let store = HistoryStore::default();
        store.record("alice", "1 + 1", 2.0).await.unwrap();
        store.record("alice", "2 + 2", 4.0).await.unwrap();
        let results: Vec<f64> = store
            .snapshot("alice")
            .await
            .iter()
            .map(|r| r.result)
            .collect();
        assert_eq!(results, vec![4.0, 2.0]);
    }

    #[tokio::test]
    async fn test_store_isolates_users() {
        let store = HistoryStore::default();
        store.record("alice", "1 + 1", 2.0).await.unwrap();
        store.record("bob", "3 × 3", 9.0).await.unwrap();
        assert_eq!(store.snapshot("alice").await.len(), 1);
        assert_eq!(store.snapshot("bob").await[0].result, 9.0);
        assert!(store.snapshot("carol").await.is_empty());
    }

    #[tokio::test]
    async fn test_store_capacity_drops_oldest() {
        let store = HistoryStore::in_memory(2);
        for i in 1..=3 {
            store.record("u", &format!("{i} + 0"), f64::from(i)).await.unwrap();
        }
        let results: Vec<f64> = store.snapshot("u").await.iter().map(|r| r.result).collect();
        assert_eq!(results, vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn test_store_zero_capacity_keeps_one() {
        let store = HistoryStore::in_memory(0);
        assert_eq!(store.capacity(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_counts_and_isolates() {
        let store = HistoryStore::default();
        store.record("alice", "1 + 1", 2.0).await.unwrap();
        store.record("alice", "2 + 2", 4.0).await.unwrap();
        store.record("bob", "3 + 3", 6.0).await.unwrap();

        assert_eq!(store.clear_all("alice").await.unwrap(), 2);
        assert!(store.snapshot("alice").await.is_empty());
        assert_eq!(store.snapshot("bob").await.len(), 1);
        assert_eq!(store.clear_all("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_yields_current_then_updates() {
        let store = HistoryStore::default();
        store.record("alice", "1 + 1", 2.0).await.unwrap();

        let mut updates = store.subscribe("alice");
        let first = updates.next().await.unwrap();
        assert_eq!(first.len(), 1);

        store.record("alice", "5 − 1", 4.0).await.unwrap();
        let second = updates.next().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].expression, "5 − 1");

        store.clear_all("alice").await.unwrap();
        let third = updates.next().await.unwrap();
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_persisted_store_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");

        let store = HistoryStore::open(&path, 10).await.unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        store.record("alice", "6 ÷ 3", 2.0).await.unwrap();
        drop(store);

        let reopened = HistoryStore::open(&path, 10).await.unwrap();
        let records = reopened.snapshot("alice").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].expression, "6 ÷ 3");
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::open(dir.path().join("absent.json"), 10)
            .await
            .unwrap();
        assert!(store.snapshot("anyone").await.is_empty());
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        let result = HistoryStore::open(&path, 10).await;
        assert!(matches!(result, Err(HistoryError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be overwritten as a file.
        let store = HistoryStore::from_records(Records::new(), 10, Some(dir.path().to_path_buf()));
        let result = store.record("alice", "1 + 1", 2.0).await;
        assert!(matches!(result, Err(HistoryError::Io(_))));
    }

    #[tokio::test]
    async fn test_failed_record_leaves_memory_untouched() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::from_records(Records::new(), 10, Some(dir.path().to_path_buf()));
        let version = store.inner.version.subscribe();

        assert!(store.record("alice", "1 + 1", 2.0).await.is_err());
        assert!(store.snapshot("alice").await.is_empty());
        assert!(!version.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_records() {
        let dir = TempDir::new().unwrap();
        let mut records = Records::new();
        records.insert(
            "alice".to_string(),
            VecDeque::from([HistoryRecord::with_timestamp("2 × 3", 6.0, None)]),
        );
        let store = HistoryStore::from_records(records, 10, Some(dir.path().to_path_buf()));

        let result = store.clear_all("alice").await;
        assert!(matches!(result, Err(HistoryError::Io(_))));
        let kept = store.snapshot("alice").await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].expression, "2 × 3");
    }

    #[tokio::test]
    async fn test_capacity_eviction_persists_trimmed_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::open(&path, 2).await.unwrap();
        for i in 1..=3 {
            store.record("u", &format!("{i} + 0"), f64::from(i)).await.unwrap();
        }

        let reopened = HistoryStore::open(&path, 2).await.unwrap();
        let results: Vec<f64> = reopened.snapshot("u").await.iter().map(|r| r.result).collect();
        assert_eq!(results, vec![3.0, 2.0]);
    }
}
