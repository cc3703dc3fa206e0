//! Snapshot persistence
//!
//! The whole store is written to a single JSON file on every mutation. Writes
//! are best-effort: a failed save leaves the in-memory store authoritative.
//! Loading is best-effort too: a missing, empty or corrupt file yields an
//! empty store instead of failing startup.

use crate::error::{InterludeError, InterludeResult};
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::session::{SessionEntry, StoreSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Format tag written into every snapshot
pub const SNAPSHOT_FORMAT: &str = "interlude.callbacks";

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotFileRef<'a> {
    format: &'a str,
    version: u32,
    saved_at: DateTime<Utc>,
    counter: u64,
    entries: &'a [SessionEntry],
}

#[derive(Deserialize)]
struct SnapshotFile {
    format: String,
    version: u32,
    counter: u64,
    #[serde(default)]
    entries: Vec<SessionEntry>,
}

/// Reads and writes the snapshot file
pub struct PersistenceGateway {
    path: PathBuf,
    reporter: Arc<dyn ErrorReporter>,
    /// Generation of the newest snapshot on disk; also serializes writers
    last_written: Mutex<u64>,
}

impl PersistenceGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reporter: Arc::new(TracingReporter),
            last_written: Mutex::new(0),
        }
    }

    /// Reporter used for load failures
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> Option<String> {
        Some(self.path.display().to_string())
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("callback_data"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Overwrite the snapshot file with `snapshot`
    ///
    /// Writers are serialized and each write goes to a temporary file that is
    /// then renamed over the target, so readers never see a partial file. A
    /// snapshot older than the one already on disk is skipped.
    pub async fn save(&self, snapshot: &StoreSnapshot) -> InterludeResult<()> {
        let mut last_written = self.last_written.lock().await;
        if snapshot.generation != 0 && snapshot.generation <= *last_written {
            debug!(
                generation = snapshot.generation,
                on_disk = *last_written,
                "Skipping stale snapshot"
            );
            return Ok(());
        }

        let body = serde_json::to_vec_pretty(&SnapshotFileRef {
            format: SNAPSHOT_FORMAT,
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            counter: snapshot.counter,
            entries: &snapshot.entries,
        })
        .map_err(|e| {
            InterludeError::persistence_write(
                format!("Failed to serialize snapshot: {}", e),
                self.display_path(),
            )
        })?;

        self.write_atomically(&body).await?;
        *last_written = (*last_written).max(snapshot.generation);

        debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            counter = snapshot.counter,
            generation = snapshot.generation,
            "Saved snapshot"
        );
        Ok(())
    }

    async fn write_atomically(&self, body: &[u8]) -> InterludeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                InterludeError::persistence_write(
                    format!("Failed to create snapshot directory: {}", e),
                    self.display_path(),
                )
            })?;
        }

        let temp_path = self.sibling(".tmp");
        fs::write(&temp_path, body).await.map_err(|e| {
            InterludeError::persistence_write(
                format!("Failed to write temporary snapshot: {}", e),
                Some(temp_path.display().to_string()),
            )
        })?;

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(InterludeError::persistence_write(
                format!("Failed to replace snapshot: {}", e),
                self.display_path(),
            ));
        }

        Ok(())
    }

    /// Read the snapshot file
    ///
    /// `Ok(None)` means there is nothing to restore (missing or blank file).
    /// Unreadable, unparsable or foreign content is an error.
    pub async fn try_load(&self) -> InterludeResult<Option<StoreSnapshot>> {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(InterludeError::persistence_load(
                    format!("Failed to read snapshot: {}", e),
                    self.display_path(),
                ));
            }
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let file: SnapshotFile = serde_json::from_slice(&content).map_err(|e| {
            InterludeError::persistence_load(
                format!("Failed to parse snapshot: {}", e),
                self.display_path(),
            )
        })?;

        if file.format != SNAPSHOT_FORMAT {
            return Err(InterludeError::persistence_load(
                format!("Unexpected snapshot format '{}'", file.format),
                self.display_path(),
            ));
        }
        if file.version != SNAPSHOT_VERSION {
            return Err(InterludeError::persistence_load(
                format!("Unsupported snapshot version {}", file.version),
                self.display_path(),
            ));
        }

        let snapshot = StoreSnapshot {
            counter: file.counter,
            entries: file.entries,
            generation: 0,
        };
        // A counter at the ceiling leaves no token to issue after restore
        if snapshot.counter.max(snapshot.highest_issued()) == u64::MAX {
            return Err(InterludeError::persistence_load(
                "Snapshot token counter is saturated",
                self.display_path(),
            ));
        }

        Ok(Some(snapshot))
    }

    /// Load the snapshot, falling back to an empty one
    ///
    /// Never fails. A corrupt file is reported, moved aside to `<name>.corrupt`
    /// and replaced by an empty snapshot; a missing file is created.
    pub async fn load(&self) -> StoreSnapshot {
        match self.try_load().await {
            Ok(Some(snapshot)) => {
                info!(
                    path = %self.path.display(),
                    entries = snapshot.entries.len(),
                    counter = snapshot.counter,
                    "Loaded snapshot"
                );
                snapshot
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No snapshot found, initialized empty store");
                self.initialize_empty().await;
                StoreSnapshot::empty()
            }
            Err(e) => {
                self.reporter.report(&e);
                self.quarantine().await;
                self.initialize_empty().await;
                StoreSnapshot::empty()
            }
        }
    }

    async fn quarantine(&self) {
        if fs::metadata(&self.path).await.is_err() {
            return;
        }
        let backup = self.sibling(".corrupt");
        match fs::rename(&self.path, &backup).await {
            Ok(()) => warn!(backup = %backup.display(), "Moved unreadable snapshot aside"),
            Err(e) => warn!(error = %e, "Failed to move unreadable snapshot aside"),
        }
    }

    async fn initialize_empty(&self) {
        if let Err(e) = self.save(&StoreSnapshot::empty()).await {
            self.reporter.report(&e);
        }
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::ResumeAction;
    use crate::event::InboundEvent;
    use crate::reporter::MockErrorReporter;
    use crate::session::{ChoiceOption, NewSession};
    use crate::token::Token;
    use tempfile::TempDir;

    fn create_test_gateway() -> (PersistenceGateway, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let gateway = PersistenceGateway::new(temp_dir.path().join("callback_data.json"));
        (gateway, temp_dir)
    }

    fn entry(counter: u64, labels: &[&str]) -> SessionEntry {
        SessionEntry::new(
            Token::from_counter(counter),
            NewSession::new(
                labels.iter().map(|l| ChoiceOption::new(*l)).collect(),
                ResumeAction::new("veto").with_payload(serde_json::json!({"group": -100})),
            )
            .with_metadata(serde_json::json!({"message_id": counter})),
            Utc::now(),
        )
    }

    fn sample_snapshot() -> StoreSnapshot {
        let pending = entry(1, &["A", "B"]);
        let mut resolved = entry(2, &["Yes", "No"]);
        resolved.selection = Some(1);
        resolved.resolved_event = Some(InboundEvent::new("2-1").with_sender("alice"));
        resolved.resolved_at = Some(Utc::now());

        StoreSnapshot {
            counter: 5,
            entries: vec![pending, resolved],
            generation: 1,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let (gateway, _temp) = create_test_gateway();
        let snapshot = sample_snapshot();

        gateway.save(&snapshot).await.unwrap();

        let reopened = PersistenceGateway::new(gateway.path());
        let loaded = reopened.try_load().await.unwrap().unwrap();

        assert_eq!(loaded.counter, 5);
        assert_eq!(loaded.tokens(), snapshot.tokens());
        for original in &snapshot.entries {
            let restored = loaded.get(original.token.as_str()).unwrap();
            assert_eq!(restored.options, original.options);
            assert_eq!(restored.created_at, original.created_at);
            assert_eq!(restored.metadata, original.metadata);
            assert_eq!(restored.resume, original.resume);
            assert_eq!(restored.selection, original.selection);
            assert_eq!(restored.resolved_event, original.resolved_event);
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_store_and_creates_file() {
        let (gateway, _temp) = create_test_gateway();
        assert!(!gateway.path().exists());

        let loaded = gateway.load().await;
        assert_eq!(loaded.counter, 0);
        assert!(loaded.is_empty());
        assert!(gateway.path().exists());

        let reread = gateway.try_load().await.unwrap().unwrap();
        assert_eq!(reread.counter, 0);
    }

    #[tokio::test]
    async fn test_blank_file_is_treated_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("callback_data.json");
        std::fs::write(&path, "  \n").unwrap();

        // No expectations: any report would panic
        let reporter = MockErrorReporter::new();
        let gateway = PersistenceGateway::new(&path).with_reporter(Arc::new(reporter));

        let loaded = gateway.load().await;
        assert!(loaded.is_empty());
        assert!(!temp_dir.path().join("callback_data.json.corrupt").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_recovers_empty_and_keeps_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("callback_data.json");

        let (good, _good_dir) = create_test_gateway();
        good.save(&sample_snapshot()).await.unwrap();
        let full = std::fs::read_to_string(good.path()).unwrap();
        std::fs::write(&path, &full[..full.len() / 2]).unwrap();

        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|e| matches!(e, InterludeError::PersistenceLoad { .. }))
            .times(1)
            .return_const(());
        let gateway = PersistenceGateway::new(&path).with_reporter(Arc::new(reporter));

        let loaded = gateway.load().await;
        assert_eq!(loaded.counter, 0);
        assert!(loaded.is_empty());

        let backup = temp_dir.path().join("callback_data.json.corrupt");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), &full[..full.len() / 2]);

        // The replacement file is a valid empty snapshot
        let reread = gateway.try_load().await.unwrap().unwrap();
        assert!(reread.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_format_is_rejected() {
        let (gateway, _temp) = create_test_gateway();
        std::fs::write(
            gateway.path(),
            r#"{"format":"something.else","version":1,"counter":3,"entries":[]}"#,
        )
        .unwrap();

        let result = gateway.try_load().await;
        assert!(matches!(result, Err(InterludeError::PersistenceLoad { .. })));
    }

    #[tokio::test]
    async fn test_stale_generation_is_not_written() {
        let (gateway, _temp) = create_test_gateway();

        let newer = StoreSnapshot {
            counter: 9,
            entries: Vec::new(),
            generation: 4,
        };
        let older = StoreSnapshot {
            counter: 3,
            entries: Vec::new(),
            generation: 2,
        };

        gateway.save(&newer).await.unwrap();
        gateway.save(&older).await.unwrap();

        let loaded = gateway.try_load().await.unwrap().unwrap();
        assert_eq!(loaded.counter, 9);
        assert!(!gateway.sibling(".tmp").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_saves_leave_newest_snapshot() {
        let (gateway, _temp) = create_test_gateway();
        let gateway = Arc::new(gateway);

        let writers: Vec<_> = (1..=64u64)
            .rev()
            .map(|generation| {
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    let snapshot = StoreSnapshot {
                        counter: generation * 10,
                        entries: vec![entry(generation, &["A", "B"])],
                        generation,
                    };
                    gateway.save(&snapshot).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let loaded = gateway.try_load().await.unwrap().unwrap();
        assert_eq!(loaded.counter, 640);
        assert_eq!(loaded.tokens(), vec![&Token::from_counter(64)]);
        assert!(!gateway.sibling(".tmp").exists());
    }

    #[tokio::test]
    async fn test_saturated_counter_is_rejected() {
        let (gateway, _temp) = create_test_gateway();
        std::fs::write(
            gateway.path(),
            r#"{"format":"interlude.callbacks","version":1,"counter":18446744073709551615,"entries":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            gateway.try_load().await,
            Err(InterludeError::PersistenceLoad { .. })
        ));

        // Same for an entry whose token encodes the ceiling
        let snapshot = StoreSnapshot {
            counter: 1,
            entries: vec![entry(u64::MAX, &["A"])],
            generation: 1,
        };
        gateway.save(&snapshot).await.unwrap();
        assert!(matches!(
            gateway.try_load().await,
            Err(InterludeError::PersistenceLoad { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = temp_dir.path().join("occupied");
        std::fs::create_dir_all(path.join("child")).unwrap();

        let gateway = PersistenceGateway::new(&path);
        let result = gateway.save(&sample_snapshot()).await;
        assert!(matches!(result, Err(InterludeError::PersistenceWrite { .. })));
    }
}
