#![forbid(unsafe_code)]

//! Cancellable deferred work driven by an explicit clock.
//!
//! A [`Debouncer`] holds at most one pending deadline. Scheduling while a
//! deadline is pending cancels it and issues a fresh [`DeferredHandle`]; the
//! quiet period restarts from the latest trigger. Nothing runs on its own:
//! the owner calls [`Debouncer::poll`] from its tick and does the work when
//! it returns `true`.
//!
//! ```
//! use cardgrid_core::Timestamp;
//! use cardgrid_runtime::debounce::Debouncer;
//!
//! let mut saves = Debouncer::new(500);
//! let first = saves.schedule(Timestamp::from_millis(0));
//! let second = saves.schedule(Timestamp::from_millis(300));
//! assert!(!saves.is_live(&first));
//! assert!(!saves.poll(Timestamp::from_millis(600)));
//! assert!(saves.poll(Timestamp::from_millis(800)));
//! assert!(!saves.is_live(&second));
//! ```

use cardgrid_core::Timestamp;

/// Handle to one scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredHandle {
    generation: u64,
    due_at: Timestamp,
}

impl DeferredHandle {
    #[must_use]
    pub const fn due_at(&self) -> Timestamp {
        self.due_at
    }
}

/// Single-slot, last-trigger-wins timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: u64,
    pending: Option<DeferredHandle>,
    generation: u64,
}

impl Debouncer {
    #[must_use]
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
            generation: 0,
        }
    }

    #[must_use]
    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Schedule the work `delay_ms` after `now`, replacing any pending deadline.
    pub fn schedule(&mut self, now: Timestamp) -> DeferredHandle {
        self.generation = self.generation.wrapping_add(1);
        let handle = DeferredHandle {
            generation: self.generation,
            due_at: now.add_millis(self.delay_ms),
        };
        self.pending = Some(handle);
        handle
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) -> Option<DeferredHandle> {
        self.pending.take()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending(&self) -> Option<DeferredHandle> {
        self.pending
    }

    /// Whether `handle` is still the one that will fire.
    #[must_use]
    pub fn is_live(&self, handle: &DeferredHandle) -> bool {
        self.pending.as_ref() == Some(handle)
    }

    /// Consume the pending deadline if it has come due.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match self.pending {
            Some(handle) if now >= handle.due_at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}
