#![forbid(unsafe_code)]

//! Width tiers and breakpoint-aware values.
//!
//! [`Breakpoints`] classifies a viewport width (CSS pixels) into a
//! [`Breakpoint`] tier. [`Responsive<T>`] maps tiers to values with
//! inheritance from smaller tiers: a tier without an explicit value uses the
//! nearest smaller tier that has one.
//!
//! # Usage
//!
//! ```
//! use cardgrid_layout::breakpoint::{Breakpoint, Breakpoints, Responsive};
//!
//! // <640 → 1 column, 640..1024 → 2, ≥1024 → 3
//! let columns = Responsive::new(1u16)
//!     .at(Breakpoint::Sm, 2)
//!     .at(Breakpoint::Lg, 3);
//!
//! let bp = Breakpoints::DEFAULT.classify_width(800);
//! assert_eq!(bp, Breakpoint::Md);
//! assert_eq!(*columns.resolve(bp), 2); // inherited from Sm
//! ```
//!
//! # Invariants
//!
//! 1. `Xs` always has a value.
//! 2. `resolve()` never fails.
//! 3. Thresholds are compared as "width ≥ threshold enters the tier".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width tier, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs = 0,
    Sm = 1,
    Md = 2,
    Lg = 3,
    Xl = 4,
}

impl Breakpoint {
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Xs => "xs",
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
            Self::Xl => "xl",
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Minimum widths (inclusive) at which each tier above `Xs` begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub sm: u32,
    pub md: u32,
    pub lg: u32,
    pub xl: u32,
}

impl Breakpoints {
    /// 640 / 768 / 1024 / 1280.
    pub const DEFAULT: Breakpoints = Breakpoints {
        sm: 640,
        md: 768,
        lg: 1024,
        xl: 1280,
    };

    /// Classify a width into a tier.
    #[must_use]
    pub const fn classify_width(&self, width: u32) -> Breakpoint {
        if width >= self.xl {
            Breakpoint::Xl
        } else if width >= self.lg {
            Breakpoint::Lg
        } else if width >= self.md {
            Breakpoint::Md
        } else if width >= self.sm {
            Breakpoint::Sm
        } else {
            Breakpoint::Xs
        }
    }

    /// Whether thresholds are strictly increasing.
    #[must_use]
    pub const fn is_monotonic(&self) -> bool {
        self.sm < self.md && self.md < self.lg && self.lg < self.xl
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A breakpoint-aware value with inheritance from smaller tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responsive<T> {
    /// Indexed by `Breakpoint` ordinal. Slot 0 is always `Some`.
    values: [Option<T>; 5],
}

impl<T> Responsive<T> {
    /// Create a value with a base for `Xs`, inherited by every larger tier.
    #[must_use]
    pub fn new(base: T) -> Self {
        Self {
            values: [Some(base), None, None, None, None],
        }
    }

    /// Set the value for a tier (builder).
    #[must_use]
    pub fn at(mut self, bp: Breakpoint, value: T) -> Self {
        self.values[bp as usize] = Some(value);
        self
    }

    /// Set the value for a tier.
    pub fn set(&mut self, bp: Breakpoint, value: T) {
        self.values[bp as usize] = Some(value);
    }

    /// Drop an override so the tier inherits again. No-op for `Xs`.
    pub fn clear(&mut self, bp: Breakpoint) {
        if bp != Breakpoint::Xs {
            self.values[bp as usize] = None;
        }
    }

    /// Resolve the value for `bp`, walking down to `Xs`.
    #[must_use]
    pub fn resolve(&self, bp: Breakpoint) -> &T {
        self.values[..=bp as usize]
            .iter()
            .rev()
            .find_map(Option::as_ref)
            .unwrap_or_else(|| self.base())
    }

    fn base(&self) -> &T {
        match &self.values[0] {
            Some(v) => v,
            // Every constructor fills slot 0 and `clear` refuses to empty it.
            None => unreachable!("Responsive base slot is always populated"),
        }
    }

    #[must_use]
    pub fn has_explicit(&self, bp: Breakpoint) -> bool {
        self.values[bp as usize].is_some()
    }

    /// Explicitly set tiers and their values, smallest first.
    pub fn explicit_values(&self) -> impl Iterator<Item = (Breakpoint, &T)> {
        Breakpoint::ALL
            .iter()
            .zip(self.values.iter())
            .filter_map(|(&bp, v)| v.as_ref().map(|val| (bp, val)))
    }
}

impl<T: Default> Default for Responsive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Serialized as a map of explicit tiers, e.g. `{ xs = 1, sm = 2, lg = 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveTable<T> {
    pub xs: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xl: Option<T>,
}

impl<T> From<ResponsiveTable<T>> for Responsive<T> {
    fn from(table: ResponsiveTable<T>) -> Self {
        Self {
            values: [Some(table.xs), table.sm, table.md, table.lg, table.xl],
        }
    }
}

impl<T: Clone> From<&Responsive<T>> for ResponsiveTable<T> {
    fn from(r: &Responsive<T>) -> Self {
        Self {
            xs: r.base().clone(),
            sm: r.values[1].clone(),
            md: r.values[2].clone(),
            lg: r.values[3].clone(),
            xl: r.values[4].clone(),
        }
    }
}

/// Default column table: `<640 → 1`, `640..1024 → 2`, `≥1024 → 3`.
#[must_use]
pub fn default_columns() -> Responsive<u16> {
    Responsive::new(1).at(Breakpoint::Sm, 2).at(Breakpoint::Lg, 3)
}
