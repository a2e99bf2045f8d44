#![forbid(unsafe_code)]

//! User-facing notices: "2 cards auto-collapsed", "Layout imported", ...
//!
//! The deck pushes [`Notice`]s into a bounded [`NoticeQueue`]; the host
//! drains it and shows toasts. The queue provides:
//!
//! - ordering by [`NoticeLevel`], errors first, FIFO within a level
//! - content-based deduplication within a configurable window
//! - a `max_queued` bound that evicts the oldest lower-level notice
//!
//! Nothing in the engine reads notices back.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

use cardgrid_core::Timestamp;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoticeId(u64);

impl NoticeId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum NoticeLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    AutoCollapsed { count: usize },
    LayoutRestored,
    LayoutReset,
    LayoutImported,
    ImportFailed { reason: String },
    PersistenceUnavailable { reason: String },
}

impl NoticeKind {
    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::AutoCollapsed { .. }
            | Self::LayoutRestored
            | Self::LayoutReset
            | Self::LayoutImported => NoticeLevel::Info,
            Self::PersistenceUnavailable { .. } => NoticeLevel::Warning,
            Self::ImportFailed { .. } => NoticeLevel::Error,
        }
    }

    /// The action a toast should offer, if any.
    #[must_use]
    pub fn action(&self) -> Option<NoticeAction> {
        match self {
            Self::AutoCollapsed { .. } => Some(NoticeAction::UndoAutoCollapse),
            _ => None,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoCollapsed { count: 1 } => f.write_str("1 card auto-collapsed"),
            Self::AutoCollapsed { count } => write!(f, "{count} cards auto-collapsed"),
            Self::LayoutRestored => f.write_str("Layout restored"),
            Self::LayoutReset => f.write_str("Layout reset to defaults"),
            Self::LayoutImported => f.write_str("Layout imported"),
            Self::ImportFailed { reason } => write!(f, "Import failed: {reason}"),
            Self::PersistenceUnavailable { reason } => {
                write!(f, "Layout changes will not be saved: {reason}")
            }
        }
    }
}

/// An action the host can invoke back on the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeAction {
    UndoAutoCollapse,
}

/// One queued notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub message: String,
    pub action: Option<NoticeAction>,
    pub created_at: Timestamp,
}

impl Notice {
    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        self.kind.level()
    }
}

/// Queue limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub max_queued: usize,
    pub dedup_window_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            max_queued: 10,
            dedup_window_ms: 1_000,
        }
    }
}

/// Bounded, level-ordered, deduplicating notice queue.
#[derive(Debug, Clone)]
pub struct NoticeQueue {
    queue: VecDeque<Notice>,
    config: NoticeConfig,
    recent: FxHashMap<u64, Timestamp>,
    next_id: u64,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(NoticeConfig::default())
    }
}

impl NoticeQueue {
    #[must_use]
    pub fn new(config: NoticeConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            config,
            recent: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Queue a notice. Returns its id, or `None` if it was a duplicate or
    /// the queue was full of notices at least as severe.
    pub fn push(&mut self, kind: NoticeKind, now: Timestamp) -> Option<NoticeId> {
        let message = kind.to_string();

        if !self.dedup_check(&message, now) {
            return None;
        }

        let level = kind.level();
        if self.config.max_queued == 0 {
            return None;
        }
        if self.queue.len() >= self.config.max_queued {
            match self.lowest_level_index() {
                Some(idx) if self.queue[idx].level() < level => {
                    self.queue.remove(idx);
                }
                _ => return None,
            }
        }

        let id = NoticeId(self.next_id);
        self.next_id += 1;
        let notice = Notice {
            id,
            action: kind.action(),
            kind,
            message,
            created_at: now,
        };
        let insert_at = self
            .queue
            .iter()
            .position(|q| q.level() < level)
            .unwrap_or(self.queue.len());
        self.queue.insert(insert_at, notice);
        Some(id)
    }

    /// Take every queued notice, most severe first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &NoticeConfig {
        &self.config
    }

    fn dedup_check(&mut self, message: &str, now: Timestamp) -> bool {
        let window = self.config.dedup_window_ms;
        self.recent
            .retain(|_, seen| now.millis_since(*seen) < window);

        let mut hasher = FxHasher::default();
        message.hash(&mut hasher);
        let hash = hasher.finish();
        if self.recent.contains_key(&hash) {
            return false;
        }
        self.recent.insert(hash, now);
        true
    }

    /// Oldest notice of the lowest level present.
    fn lowest_level_index(&self) -> Option<usize> {
        let lowest = self.queue.iter().map(Notice::level).min()?;
        self.queue.iter().position(|n| n.level() == lowest)
    }
}
