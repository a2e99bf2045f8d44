#![forbid(unsafe_code)]

//! Opaque card content.
//!
//! The engine keys content by [`CardId`](crate::CardId) and hands it to the
//! renderer untouched. Nothing in cardgrid reads these fields.

use serde::{Deserialize, Serialize};

/// A labelled value shown on a card (e.g. "Turnaround: 48h").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

/// A call-to-action. `target` is resolved by the host (route, link, handler key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub label: String,
    pub target: String,
}

/// Default content payload for a card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardContent {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub primary_action: Option<ActionRef>,
    #[serde(default)]
    pub secondary_action: Option<ActionRef>,
    #[serde(default)]
    pub badge: Option<String>,
}

impl CardContent {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn metric(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.metrics.push(Metric {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn primary_action(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.primary_action = Some(ActionRef {
            label: label.into(),
            target: target.into(),
        });
        self
    }

    #[must_use]
    pub fn secondary_action(
        mut self,
        label: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.secondary_action = Some(ActionRef {
            label: label.into(),
            target: target.into(),
        });
        self
    }

    #[must_use]
    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}
