#![forbid(unsafe_code)]

//! cardgrid error model and graceful fallback.
//!
//! # Design Principles
//!
//! 1. **Result everywhere**: no panics on user input, stored data, or storage.
//! 2. **Domain-specific errors**: each subsystem keeps its own typed error;
//!    [`Error`] only unifies them for hosts that want one type.
//! 3. **Graceful fallback**: every variant maps to a [`Fallback`] the host
//!    applies to keep the dashboard usable.

use std::fmt;

use cardgrid_layout::{DragRejected, SnapshotError};
use cardgrid_runtime::{ConfigError, DecodeError, DeckError, ImportError, StorageError};

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for cardgrid hosts.
#[derive(Debug)]
pub enum Error {
    /// Building the deck failed.
    Deck(DeckError),
    /// Loading or validating configuration failed.
    Config(ConfigError),
    /// An uploaded layout was rejected.
    Import(ImportError),
    /// A stored layout could not be decoded.
    Decode(DecodeError),
    /// A snapshot failed schema validation.
    Snapshot(SnapshotError),
    /// The storage backend failed.
    Storage(StorageError),
    /// A drag gesture could not start.
    Drag(DragRejected),
}

/// Standard result type for cardgrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Graceful Fallback ───────────────────────────────────────────────────

/// What the host should do when an error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Keep working from in-memory state; changes will not persist.
    KeepInMemory,
    /// Start from the default layout.
    UseDefaults,
    /// Discard the uploaded file. The current layout is untouched.
    DropImport,
    /// Ignore the gesture.
    IgnoreGesture,
    /// Retry with `DeckConfig::default()`.
    DefaultConfig,
    /// The caller's default layout is unusable and must be fixed.
    Abort,
}

impl Error {
    /// The fallback for this error.
    pub fn fallback(&self) -> Fallback {
        match self {
            Self::Deck(DeckError::InvalidConfig(_)) => Fallback::DefaultConfig,
            Self::Deck(DeckError::DuplicateCard(_) | DeckError::EmptyCardId) => Fallback::Abort,

            Self::Config(_) => Fallback::DefaultConfig,
            Self::Import(_) => Fallback::DropImport,
            Self::Decode(_) | Self::Snapshot(_) => Fallback::UseDefaults,
            Self::Storage(_) => Fallback::KeepInMemory,
            Self::Drag(_) => Fallback::IgnoreGesture,
        }
    }

    /// Error type label for metrics and tracing.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Deck(_) => "deck",
            Self::Config(_) => "config",
            Self::Import(_) => "import",
            Self::Decode(_) => "decode",
            Self::Snapshot(_) => "snapshot",
            Self::Storage(_) => "storage",
            Self::Drag(_) => "drag",
        }
    }

    /// Whether the host can keep running.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.fallback(), Fallback::Abort)
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deck(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Decode(err) => write!(f, "stored layout: {err}"),
            Self::Snapshot(err) => write!(f, "layout snapshot: {err}"),
            Self::Storage(err) => write!(f, "storage: {err}"),
            Self::Drag(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepInMemory => write!(f, "keep_in_memory"),
            Self::UseDefaults => write!(f, "use_defaults"),
            Self::DropImport => write!(f, "drop_import"),
            Self::IgnoreGesture => write!(f, "ignore_gesture"),
            Self::DefaultConfig => write!(f, "default_config"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Deck(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Drag(err) => Some(err),
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<DeckError> for Error {
    fn from(err: DeckError) -> Self {
        Self::Deck(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ImportError> for Error {
    fn from(err: ImportError) -> Self {
        Self::Import(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<SnapshotError> for Error {
    fn from(err: SnapshotError) -> Self {
        Self::Snapshot(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<DragRejected> for Error {
    fn from(err: DragRejected) -> Self {
        Self::Drag(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use cardgrid_core::CardId;
    use cardgrid_runtime::{DeckConfig, decode_snapshot, import_snapshot};

    use super::*;

    #[test]
    fn duplicate_card_aborts() {
        let err = Error::from(DeckError::DuplicateCard(CardId::from("ai")));
        assert_eq!(err.fallback(), Fallback::Abort);
        assert!(!err.is_recoverable());
        assert_eq!(err.error_type(), "deck");
        assert!(err.to_string().contains("ai"));
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let err = Error::from(DeckError::InvalidConfig(vec!["notices.max_queued must be > 0".into()]));
        assert_eq!(err.fallback(), Fallback::DefaultConfig);
        assert!(err.is_recoverable());

        let parse = DeckConfig::from_toml_str("resize_debounce_ms = \"soon\"").unwrap_err();
        let err = Error::from(parse);
        assert_eq!(err.fallback(), Fallback::DefaultConfig);
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn rejected_import_is_dropped() {
        let err = Error::from(import_snapshot("not json").unwrap_err());
        assert_eq!(err.fallback(), Fallback::DropImport);
        assert_eq!(err.error_type(), "import");
    }

    #[test]
    fn corrupt_store_uses_defaults() {
        let err = Error::from(decode_snapshot("{").unwrap_err());
        assert_eq!(err.fallback(), Fallback::UseDefaults);
        assert!(err.to_string().starts_with("stored layout:"));

        let err = Error::from(SnapshotError::DuplicateCard {
            id: CardId::from("a"),
        });
        assert_eq!(err.fallback(), Fallback::UseDefaults);
    }

    #[test]
    fn storage_failure_keeps_memory_state() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::from(StorageError::from(io));
        assert_eq!(err.fallback(), Fallback::KeepInMemory);
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn drag_rejection_ignores_gesture() {
        let err = Error::from(DragRejected::NotCustomizing);
        assert_eq!(err.fallback(), Fallback::IgnoreGesture);
    }

    #[test]
    fn fallback_labels() {
        assert_eq!(Fallback::KeepInMemory.to_string(), "keep_in_memory");
        assert_eq!(Fallback::Abort.to_string(), "abort");
    }
}
