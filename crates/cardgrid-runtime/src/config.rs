#![forbid(unsafe_code)]

//! Engine configuration as data.
//!
//! A single [`DeckConfig`] groups every tunable: breakpoint thresholds,
//! column table, space heuristic, auto-collapse defaults, persistence, resize
//! debounce, and notice limits. It loads from TOML or JSON, and every field
//! has a default, so a partial file only overrides what it names.
//!
//! Two tables are filled field by field: `[auto_collapse]` keys missing from
//! the file keep their defaults, and `[columns]` without `xs` gets the default
//! base tier. The other column tiers are taken as written, so a file that
//! names any tier describes the whole ladder above `xs`.
//!
//! ```toml
//! resize_debounce_ms = 200
//!
//! [columns]
//! xs = 1
//! md = 2
//! xl = 4
//!
//! [space]
//! min_card_width = 280
//!
//! [auto_collapse]
//! enabled = true
//! collapse_percentage = 50
//! ```

use std::path::Path;

use cardgrid_layout::{
    AutoCollapseSettings, Breakpoint, Breakpoints, MAX_COLUMNS, Responsive, ResponsiveTable,
    SpaceConfig, SpaceDetector, default_columns,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::notice::NoticeConfig;
use crate::persistence::PersistenceConfig;
use crate::storage::is_valid_key;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub breakpoints: Breakpoints,
    #[serde(deserialize_with = "columns_with_default_base")]
    pub columns: ResponsiveTable<u16>,
    pub space: SpaceConfig,
    #[serde(deserialize_with = "auto_collapse_with_defaults")]
    pub auto_collapse: AutoCollapseSettings,
    pub persistence: PersistenceConfig,
    /// Quiet period before a resize is evaluated.
    pub resize_debounce_ms: u64,
    pub notices: NoticeConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::DEFAULT,
            columns: ResponsiveTable::from(&default_columns()),
            space: SpaceConfig::default(),
            auto_collapse: AutoCollapseSettings::default(),
            persistence: PersistenceConfig::default(),
            resize_debounce_ms: 150,
            notices: NoticeConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Partial tables
// ---------------------------------------------------------------------------

/// `[auto_collapse]` as written in a config file. Snapshots keep the strict
/// schema; only the config path tolerates missing keys.
#[derive(Deserialize)]
struct PartialAutoCollapse {
    enabled: Option<bool>,
    #[serde(alias = "collapsePercentage")]
    collapse_percentage: Option<u8>,
    #[serde(alias = "undoWindowMs")]
    undo_window_ms: Option<u64>,
}

fn auto_collapse_with_defaults<'de, D>(deserializer: D) -> Result<AutoCollapseSettings, D::Error>
where
    D: Deserializer<'de>,
{
    let partial = PartialAutoCollapse::deserialize(deserializer)?;
    let base = AutoCollapseSettings::default();
    Ok(AutoCollapseSettings {
        enabled: partial.enabled.unwrap_or(base.enabled),
        collapse_percentage: partial.collapse_percentage.unwrap_or(base.collapse_percentage),
        undo_window_ms: partial.undo_window_ms.unwrap_or(base.undo_window_ms),
    })
}

#[derive(Deserialize)]
struct PartialColumns {
    xs: Option<u16>,
    sm: Option<u16>,
    md: Option<u16>,
    lg: Option<u16>,
    xl: Option<u16>,
}

fn columns_with_default_base<'de, D>(deserializer: D) -> Result<ResponsiveTable<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let partial = PartialColumns::deserialize(deserializer)?;
    Ok(ResponsiveTable {
        xs: partial.xs.unwrap_or_else(|| *default_columns().resolve(Breakpoint::Xs)),
        sm: partial.sm,
        md: partial.md,
        lg: partial.lg,
        xl: partial.xl,
    })
}

impl DeckConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check every parameter. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.breakpoints.is_monotonic() {
            errors.push(format!(
                "breakpoints must be strictly increasing, got sm={} md={} lg={} xl={}",
                self.breakpoints.sm, self.breakpoints.md, self.breakpoints.lg, self.breakpoints.xl
            ));
        }

        let columns = self.column_table();
        for (bp, cols) in columns.explicit_values() {
            if !(1..=MAX_COLUMNS).contains(cols) {
                errors.push(format!(
                    "columns.{bp} must be in 1..={MAX_COLUMNS}, got {cols}"
                ));
            }
        }

        let ratio = self.space.comfortable_height_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            errors.push(format!(
                "space.comfortable_height_ratio must be > 0, got {ratio}"
            ));
        }

        let h = &self.space.density_heights;
        if h.compact > h.standard || h.standard > h.expanded {
            errors.push(format!(
                "space.density_heights must not decrease with density, got {}/{}/{}",
                h.compact, h.standard, h.expanded
            ));
        }

        if self.auto_collapse.collapse_percentage > 100 {
            errors.push(format!(
                "auto_collapse.collapse_percentage must be <= 100, got {}",
                self.auto_collapse.collapse_percentage
            ));
        }

        let key = &self.persistence.storage_key;
        if key.is_empty() {
            errors.push("persistence.storage_key must not be empty".into());
        } else if !is_valid_key(key) {
            errors.push(format!(
                "persistence.storage_key may only use ASCII letters, digits, '-', '_' and '.' \
                 and must not start with '.', got {key:?}"
            ));
        }

        if self.notices.max_queued == 0 {
            errors.push("notices.max_queued must be > 0".into());
        }

        errors
    }

    /// The column table as a resolvable value.
    #[must_use]
    pub fn column_table(&self) -> Responsive<u16> {
        self.columns.clone().into()
    }

    /// Build the space detector described by this config.
    #[must_use]
    pub fn detector(&self) -> SpaceDetector {
        SpaceDetector::new(self.breakpoints, self.column_table(), self.space)
    }

    /// Columns at the widest tier, for hosts that size a column picker.
    #[must_use]
    pub fn widest_columns(&self) -> u16 {
        *self.column_table().resolve(Breakpoint::Xl)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
