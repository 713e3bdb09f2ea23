//! Savings goals and their progress helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A named savings target with the amount set aside for it so far.
pub struct SavingsGoal {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub target: Amount,
    pub accumulated: Amount,
    #[serde(rename = "timestamp", alias = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        target: Amount,
        accumulated: Amount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            name: name.into(),
            target,
            accumulated,
            last_updated: now,
        }
    }

    /// Case-insensitive match on the (name, category) pair that identifies a goal.
    pub fn matches(&self, name: &str, category: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
            && self.category.to_lowercase() == category.to_lowercase()
    }

    /// Amount still missing to reach the target; zero once reached or exceeded.
    pub fn remaining(&self) -> Amount {
        self.target.saturating_sub(self.accumulated).max(0)
    }

    /// Rounded completion percentage, capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.target <= 0 {
            return 0;
        }
        let ratio = self.accumulated as f64 * 100.0 / self.target as f64;
        ratio.round().clamp(0.0, 100.0) as u8
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}

/// Resolves the display name of a goal, falling back to its category when blank.
pub fn resolve_goal_name(name: &str, category: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        normalize_label(category)
    } else {
        trimmed.to_string()
    }
}
