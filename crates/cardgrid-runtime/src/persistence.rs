#![forbid(unsafe_code)]

//! Layout persistence: debounced autosave, load, export, import, clear.
//!
//! [`LayoutPersistence`] wraps a [`StorageBackend`] and one storage key. It
//! never touches cards; the deck captures a [`LayoutSnapshot`] and hands it
//! over when the save debouncer fires.
//!
//! # Decoding
//!
//! Stored blobs and imported files go through the same path:
//! JSON parse, schema migration, structural validation. Any failure leaves
//! the caller's state untouched.
//!
//! # Failure Modes
//!
//! - **Save fails** (quota, storage disabled): logged every time, reported
//!   once per failure streak. The next successful save re-arms reporting.
//! - **Stored blob is corrupt**: load reports [`LoadOutcome::Corrupt`]; the
//!   caller falls back to defaults. The blob stays until the next save
//!   overwrites it.
//! - **Store unreachable on load**: [`LoadOutcome::Unavailable`].

use cardgrid_core::Timestamp;
use cardgrid_layout::{LayoutSnapshot, SnapshotError, SnapshotMigrationError, migrate_snapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::debounce::{Debouncer, DeferredHandle};
use crate::storage::{StorageBackend, StorageError};

/// Where and how often the layout is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub storage_key: String,
    pub save_debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            storage_key: "cardgrid.layout".to_owned(),
            save_debounce_ms: 500,
        }
    }
}

// =========================================================================
// Decoding
// =========================================================================

/// Why a snapshot blob could not be used.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a layout snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Migration(#[from] SnapshotMigrationError),
    #[error("invalid layout snapshot: {0}")]
    Invalid(#[from] SnapshotError),
}

/// Parse, migrate, and validate a snapshot.
pub fn decode_snapshot(text: &str) -> Result<LayoutSnapshot, DecodeError> {
    let raw: LayoutSnapshot = serde_json::from_str(text)?;
    let snapshot = migrate_snapshot(raw)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Serialize a snapshot with cards in order.
pub fn encode_snapshot(snapshot: &LayoutSnapshot, pretty: bool) -> serde_json::Result<String> {
    let mut canonical = snapshot.clone();
    canonical.canonicalize();
    if pretty {
        serde_json::to_string_pretty(&canonical)
    } else {
        serde_json::to_string(&canonical)
    }
}

// =========================================================================
// Export / import
// =========================================================================

/// A standalone, human-readable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `cardgrid-layout-<YYYYMMDD-HHMMSS>.json`, from `saved_at`.
    pub file_name: String,
    pub contents: String,
}

/// Build an export file for `snapshot`.
pub fn export_file(snapshot: &LayoutSnapshot) -> serde_json::Result<ExportFile> {
    let contents = encode_snapshot(snapshot, true)?;
    let file_name = format!(
        "cardgrid-layout-{}.json",
        snapshot.saved_at.format("%Y%m%d-%H%M%S")
    );
    Ok(ExportFile {
        file_name,
        contents,
    })
}

/// Why an import was rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import rejected: {0}")]
    Decode(#[from] DecodeError),
}

impl ImportError {
    /// Short reason suitable for a toast.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Decode(inner) => inner.to_string(),
        }
    }
}

/// Decode an uploaded export.
pub fn import_snapshot(text: &str) -> Result<LayoutSnapshot, ImportError> {
    Ok(decode_snapshot(text)?)
}

// =========================================================================
// LayoutPersistence
// =========================================================================

/// Result of reading the stored snapshot.
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    Loaded(LayoutSnapshot),
    Corrupt(DecodeError),
    Unavailable(StorageError),
}

/// Result of one save attempt.
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    Failed {
        error: StorageError,
        /// First failure since the last success; surface it to the user.
        report: bool,
    },
}

impl SaveStatus {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Debounced snapshot storage under one key.
#[derive(Debug)]
pub struct LayoutPersistence<S> {
    backend: S,
    key: String,
    saves: Debouncer,
    failing: bool,
    save_count: u64,
}

impl<S: StorageBackend> LayoutPersistence<S> {
    #[must_use]
    pub fn new(backend: S, config: &PersistenceConfig) -> Self {
        Self {
            backend,
            key: config.storage_key.clone(),
            saves: Debouncer::new(config.save_debounce_ms),
            failing: false,
            save_count: 0,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Request a save after the quiet period, replacing any pending request.
    pub fn schedule_save(&mut self, now: Timestamp) -> DeferredHandle {
        self.saves.schedule(now)
    }

    #[must_use]
    pub fn save_pending(&self) -> bool {
        self.saves.is_pending()
    }

    pub fn cancel_save(&mut self) -> bool {
        self.saves.cancel().is_some()
    }

    /// Whether the pending save has come due. Consumes it.
    pub fn poll_save(&mut self, now: Timestamp) -> bool {
        self.saves.poll(now)
    }

    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.save_count
    }

    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failing
    }

    /// Write `snapshot` now.
    pub fn save(&mut self, snapshot: &LayoutSnapshot) -> SaveStatus {
        let result = encode_snapshot(snapshot, false)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.store(&self.key, &json));
        match result {
            Ok(()) => {
                if self.failing {
                    info!(target: "cardgrid.persist", key = %self.key, "storage recovered");
                }
                self.failing = false;
                self.save_count += 1;
                debug!(
                    target: "cardgrid.persist",
                    key = %self.key,
                    backend = self.backend.name(),
                    cards = snapshot.cards.len(),
                    "layout saved"
                );
                SaveStatus::Saved
            }
            Err(error) => {
                let report = !self.failing;
                self.failing = true;
                if report {
                    warn!(
                        target: "cardgrid.persist",
                        key = %self.key,
                        error = %error,
                        "layout save failed; continuing without persistence"
                    );
                } else {
                    debug!(target: "cardgrid.persist", key = %self.key, error = %error, "layout save failed again");
                }
                SaveStatus::Failed { error, report }
            }
        }
    }

    /// Read the stored snapshot.
    pub fn load(&self) -> LoadOutcome {
        let text = match self.backend.load(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(target: "cardgrid.persist", key = %self.key, "no stored layout");
                return LoadOutcome::Missing;
            }
            Err(error) => {
                warn!(target: "cardgrid.persist", key = %self.key, error = %error, "storage unavailable on load");
                return LoadOutcome::Unavailable(error);
            }
        };
        match decode_snapshot(&text) {
            Ok(snapshot) => {
                info!(
                    target: "cardgrid.persist",
                    key = %self.key,
                    cards = snapshot.cards.len(),
                    saved_at = %snapshot.saved_at,
                    "stored layout loaded"
                );
                LoadOutcome::Loaded(snapshot)
            }
            Err(error) => {
                warn!(
                    target: "cardgrid.persist",
                    key = %self.key,
                    error = %error,
                    "stored layout is corrupt; using defaults"
                );
                LoadOutcome::Corrupt(error)
            }
        }
    }

    /// Remove the stored snapshot and drop any pending save.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.saves.cancel();
        self.backend.remove(&self.key)?;
        info!(target: "cardgrid.persist", key = %self.key, "stored layout cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use cardgrid_core::{CardId, Density, Priority};
    use cardgrid_layout::{AutoCollapseSettings, CardRecord};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> LayoutSnapshot {
        LayoutSnapshot {
            version: 1,
            cards: vec![
                CardRecord {
                    id: CardId::from("b"),
                    order: 1,
                    density: Density::Compact,
                    priority: Priority::Normal,
                },
                CardRecord {
                    id: CardId::from("a"),
                    order: 0,
                    density: Density::Expanded,
                    priority: Priority::Pinned,
                },
            ],
            grid_columns: Some(2),
            auto_collapse_settings: AutoCollapseSettings::default(),
            saved_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap(),
        }
    }

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn export_name_and_canonical_order() {
        let file = export_file(&snapshot()).unwrap();
        assert_eq!(file.file_name, "cardgrid-layout-20261018-090507.json");
        let a = file.contents.find("\"a\"").unwrap();
        let b = file.contents.find("\"b\"").unwrap();
        assert!(a < b);
        assert!(file.contents.contains('\n'));
    }

    #[test]
    fn export_then_import_is_identity_after_canonicalize() {
        let file = export_file(&snapshot()).unwrap();
        let back = import_snapshot(&file.contents).unwrap();
        let mut expected = snapshot();
        expected.canonicalize();
        assert_eq!(back, expected);
    }

    #[test]
    fn import_rejects_missing_order() {
        let text = r#"{
            "version": 1,
            "cards": [{"id": "a", "density": "compact", "priority": "normal"}],
            "gridColumns": null,
            "autoCollapseSettings": {"enabled": true, "collapsePercentage": 40},
            "savedAt": "2026-10-18T09:30:00Z"
        }"#;
        let err = import_snapshot(text).unwrap_err();
        assert!(matches!(err, ImportError::Decode(DecodeError::Parse(_))));
        assert!(err.reason().contains("order"));
    }

    #[test]
    fn import_rejects_structural_problems() {
        let mut snap = snapshot();
        snap.cards[0].id = CardId::from("a");
        let text = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            import_snapshot(&text),
            Err(ImportError::Decode(DecodeError::Invalid(SnapshotError::DuplicateCard { .. })))
        ));
        assert!(matches!(
            import_snapshot("[]"),
            Err(ImportError::Decode(DecodeError::Parse(_)))
        ));
    }

    #[test]
    fn import_rejects_future_version() {
        let mut snap = snapshot();
        snap.version = 2;
        let text = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            import_snapshot(&text),
            Err(ImportError::Decode(DecodeError::Migration(_)))
        ));
    }

    #[test]
    fn debounced_save_round_trip() {
        let storage = MemoryStorage::new();
        let mut p = LayoutPersistence::new(storage.clone(), &PersistenceConfig::default());
        p.schedule_save(at(0));
        p.schedule_save(at(100));
        assert!(!p.poll_save(at(599)));
        assert!(p.poll_save(at(600)));
        assert!(p.save(&snapshot()).is_saved());
        assert_eq!(p.save_count(), 1);
        assert!(storage.peek("cardgrid.layout").is_some());

        match p.load() {
            LoadOutcome::Loaded(loaded) => assert_eq!(loaded.cards[0].id, CardId::from("a")),
            other => panic!("expected loaded snapshot, got {other:?}"),
        }
    }

    #[test]
    fn failures_reported_once_per_streak() {
        let storage = MemoryStorage::new();
        let mut p = LayoutPersistence::new(storage.clone(), &PersistenceConfig::default());
        storage.set_unavailable(Some("disabled"));

        let first = p.save(&snapshot());
        let second = p.save(&snapshot());
        assert!(matches!(first, SaveStatus::Failed { report: true, .. }));
        assert!(matches!(second, SaveStatus::Failed { report: false, .. }));
        assert!(p.is_failing());

        storage.set_unavailable(None);
        assert!(p.save(&snapshot()).is_saved());
        storage.set_unavailable(Some("disabled"));
        assert!(matches!(
            p.save(&snapshot()),
            SaveStatus::Failed { report: true, .. }
        ));
    }

    #[test]
    fn load_outcomes() {
        let storage = MemoryStorage::new();
        let mut p = LayoutPersistence::new(storage.clone(), &PersistenceConfig::default());
        assert!(matches!(p.load(), LoadOutcome::Missing));

        storage.insert_raw("cardgrid.layout", "{ not json");
        assert!(matches!(p.load(), LoadOutcome::Corrupt(_)));

        storage.set_unavailable(Some("offline"));
        assert!(matches!(p.load(), LoadOutcome::Unavailable(_)));

        storage.set_unavailable(None);
        p.schedule_save(at(0));
        p.clear().unwrap();
        assert!(!p.save_pending());
        assert!(matches!(p.load(), LoadOutcome::Missing));
    }
}
