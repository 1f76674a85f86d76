//! JSON-file backed dedup store for posted clip ids.
//!
//! The file holds a single document:
//!
//! ```json
//! { "postedClipIds": [ { "id": "AbCd1234", "date": 1594545155039 } ] }
//! ```
//!
//! It is read in full on open and rewritten (temp file + rename) on every
//! new record.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::StoreError;

/// A clip that was successfully relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Clip id (dedup key).
    pub id: String,
    /// When it was posted, in milliseconds since the Unix epoch.
    pub date: i64,
}

impl ClipRecord {
    /// Posting time as a timestamp.
    #[must_use]
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.date)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    #[serde(default)]
    posted_clip_ids: Vec<ClipRecord>,
}

#[derive(Debug, Default)]
struct Records {
    doc: StoreDocument,
    ids: HashSet<String>,
}

/// Set of clip ids already posted, persisted to disk.
#[derive(Debug)]
pub struct ClipStore {
    path: PathBuf,
    records: tokio::sync::Mutex<Records>,
    in_flight: Mutex<HashSet<String>>,
}

impl ClipStore {
    /// Open the store at `path`, creating an empty one if missing or blank.
    ///
    /// With `retention` set, records older than the window are dropped.
    pub async fn open(path: impl AsRef<Path>, retention: Option<Duration>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let (mut doc, mut dirty) = match read_document(&path).await? {
            Some(doc) => (doc, false),
            None => (StoreDocument::default(), true),
        };

        // A window reaching past the representable range keeps everything.
        if let Some(cutoff) = retention.and_then(|window| Utc::now().checked_sub_signed(window)) {
            let cutoff = cutoff.timestamp_millis();
            let before = doc.posted_clip_ids.len();
            doc.posted_clip_ids.retain(|r| r.date >= cutoff);
            let dropped = before - doc.posted_clip_ids.len();
            if dropped > 0 {
                info!(dropped, "Compacted expired clip records");
                dirty = true;
            }
        }

        let store = Self::from_document(path, doc);

        if dirty {
            let records = store.records.lock().await;
            store.persist(&records.doc).await?;
        }

        debug!(path = %store.path.display(), "Opened clip store");
        Ok(store)
    }

    /// Open an existing store without writing to it.
    ///
    /// Returns `None` when the file is missing or blank.
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Option<Self>, StoreError> {
        let path = path.as_ref().to_path_buf();
        Ok(read_document(&path)
            .await?
            .map(|doc| Self::from_document(path, doc)))
    }

    fn from_document(path: PathBuf, mut doc: StoreDocument) -> Self {
        // Keep the first record of any id that somehow appears twice.
        let mut ids = HashSet::with_capacity(doc.posted_clip_ids.len());
        doc.posted_clip_ids.retain(|r| ids.insert(r.id.clone()));

        Self {
            path,
            records: tokio::sync::Mutex::new(Records { doc, ids }),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `id` has been recorded.
    pub async fn has(&self, id: &str) -> bool {
        self.records.lock().await.ids.contains(id)
    }

    /// Look up the record for `id`.
    pub async fn get(&self, id: &str) -> Option<ClipRecord> {
        let records = self.records.lock().await;
        records
            .doc
            .posted_clip_ids
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Record `id` as posted at `at`. Recording an existing id is a no-op.
    ///
    /// Returns whether a new record was written.
    pub async fn record(&self, id: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        if records.ids.contains(id) {
            return Ok(false);
        }

        records.doc.posted_clip_ids.push(ClipRecord {
            id: id.to_string(),
            date: at.timestamp_millis(),
        });
        if let Err(e) = self.persist(&records.doc).await {
            records.doc.posted_clip_ids.pop();
            return Err(e);
        }
        records.ids.insert(id.to_string());
        debug!(clip_id = id, "Recorded posted clip");
        Ok(true)
    }

    /// Reserve `id` for one in-progress post.
    ///
    /// Returns `None` if the id is already recorded or another handler holds
    /// it. The reservation is released when the guard drops unless it is
    /// committed.
    pub async fn claim(self: &Arc<Self>, id: &str) -> Option<ClaimGuard> {
        if !self.lock_in_flight().insert(id.to_string()) {
            return None;
        }
        if self.has(id).await {
            self.release(id);
            return None;
        }
        Some(ClaimGuard {
            store: Arc::clone(self),
            id: id.to_string(),
        })
    }

    /// Most recent records first.
    pub async fn recent(&self, limit: usize) -> Vec<ClipRecord> {
        let records = self.records.lock().await;
        let mut all = records.doc.posted_clip_ids.clone();
        all.sort_by(|a, b| b.date.cmp(&a.date));
        all.truncate(limit);
        all
    }

    /// Number of recorded clips.
    pub async fn len(&self) -> usize {
        self.records.lock().await.ids.len()
    }

    /// Whether no clip has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: &str) {
        self.lock_in_flight().remove(id);
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(doc).map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await.map_err(io_err)?;
        fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

async fn read_document(path: &Path) -> Result<Option<StoreDocument>, StoreError> {
    match fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.display().to_string(),
                source,
            }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Exclusive reservation of a clip id while it is being posted.
#[derive(Debug)]
pub struct ClaimGuard {
    store: Arc<ClipStore>,
    id: String,
}

impl ClaimGuard {
    /// The reserved clip id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Record the clip as posted and release the reservation.
    pub async fn commit(self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = self.store.record(&self.id, at).await;
        if let Err(e) = &result {
            warn!(clip_id = %self.id, error = %e, "Failed to persist clip record");
        }
        result.map(|_| ())
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.store.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, Arc<ClipStore>) {
        let temp_dir = TempDir::new().unwrap();
        let store = ClipStore::open(temp_dir.path().join("db.json"), None)
            .await
            .unwrap();
        (temp_dir, Arc::new(store))
    }

    #[tokio::test]
    async fn test_open_initializes_empty_file() {
        let (temp_dir, store) = setup_store().await;
        assert!(store.is_empty().await);

        let content = std::fs::read_to_string(temp_dir.path().join("db.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["postedClipIds"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_blank_file_is_initialized() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(&path, "  \n").unwrap();

        let store = ClipStore::open(&path, None).await.unwrap();
        assert!(store.is_empty().await);
        assert!(std::fs::read_to_string(&path).unwrap().contains("postedClipIds"));
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ClipStore::open(&path, None).await.unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[tokio::test]
    async fn test_record_then_has() {
        let (_temp_dir, store) = setup_store().await;
        assert!(!store.has("AbCd1234").await);

        assert!(store.record("AbCd1234", Utc::now()).await.unwrap());
        assert!(store.has("AbCd1234").await);
        assert!(!store.has("abcd1234").await);
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let (_temp_dir, store) = setup_store().await;
        assert!(store.record("Clip", Utc::now()).await.unwrap());
        assert!(!store.record("Clip", Utc::now()).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reload_preserves_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/db.json");
        let posted = DateTime::from_timestamp_millis(1_594_545_155_039).unwrap();

        {
            let store = ClipStore::open(&path, None).await.unwrap();
            store.record("One", posted).await.unwrap();
            store.record("Two", Utc::now()).await.unwrap();
        }

        let store = ClipStore::open(&path, None).await.unwrap();
        assert!(store.has("One").await);
        assert!(store.has("Two").await);
        let one = store.get("One").await.unwrap();
        assert_eq!(one.date, 1_594_545_155_039);
        assert_eq!(one.posted_at(), Some(posted));
    }

    #[tokio::test]
    async fn test_reads_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(
            &path,
            r#"{"postedClipIds":[{"id":"Old","date":1500000000000},{"id":"Old","date":1600000000000}]}"#,
        )
        .unwrap();

        let store = ClipStore::open(&path, None).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("Old").await.unwrap().date, 1_500_000_000_000);
    }

    #[tokio::test]
    async fn test_retention_compacts_old_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let fresh = Utc::now().timestamp_millis();
        std::fs::write(
            &path,
            format!(r#"{{"postedClipIds":[{{"id":"Ancient","date":1000}},{{"id":"Fresh","date":{fresh}}}]}}"#),
        )
        .unwrap();

        let store = ClipStore::open(&path, Some(Duration::days(30))).await.unwrap();
        assert!(!store.has("Ancient").await);
        assert!(store.has("Fresh").await);

        let reopened = ClipStore::open(&path, None).await.unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn test_huge_retention_keeps_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        std::fs::write(&path, r#"{"postedClipIds":[{"id":"Ancient","date":1000}]}"#).unwrap();

        let store = ClipStore::open(&path, Some(Duration::days(100_000_000)))
            .await
            .unwrap();
        assert!(store.has("Ancient").await);
    }

    #[tokio::test]
    async fn test_open_existing_never_creates_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");

        assert!(ClipStore::open_existing(&path).await.unwrap().is_none());
        assert!(!path.exists());

        std::fs::write(&path, r#"{"postedClipIds":[{"id":"One","date":1000}]}"#).unwrap();
        let store = ClipStore::open_existing(&path).await.unwrap().unwrap();
        assert!(store.has("One").await);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let (_temp_dir, store) = setup_store().await;

        let guard = store.claim("Clip").await.unwrap();
        assert_eq!(guard.id(), "Clip");
        assert!(store.claim("Clip").await.is_none());
        assert!(store.claim("Other").await.is_some());

        drop(guard);
        assert!(store.claim("Clip").await.is_some());
    }

    #[tokio::test]
    async fn test_committed_claim_blocks_future_claims() {
        let (_temp_dir, store) = setup_store().await;

        let guard = store.claim("Clip").await.unwrap();
        guard.commit(Utc::now()).await.unwrap();

        assert!(store.has("Clip").await);
        assert!(store.claim("Clip").await.is_none());
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first() {
        let (_temp_dir, store) = setup_store().await;
        let t = |ms| DateTime::from_timestamp_millis(ms).unwrap();
        store.record("A", t(1_000)).await.unwrap();
        store.record("C", t(3_000)).await.unwrap();
        store.record("B", t(2_000)).await.unwrap();

        let ids: Vec<_> = store.recent(2).await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["C", "B"]);
    }
}
