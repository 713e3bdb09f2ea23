//! The ledger aggregate root and its lookup helpers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, goal::SavingsGoal, movement::Movement};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
/// Complete ledger state at one point in time.
pub struct LedgerSnapshot {
    pub available_cash: Amount,
    pub total_saved: Amount,
    /// Newest first; temporal order comes from each movement's timestamp.
    pub movements: Vec<Movement>,
    pub goals: Vec<SavingsGoal>,
}

/// Name the browser client used for the snapshot type.
pub type SavyState = LedgerSnapshot;

impl LedgerSnapshot {
    /// Canonical empty snapshot used for first runs and self-healing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn goal(&self, id: Uuid) -> Option<&SavingsGoal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn goal_mut(&mut self, id: Uuid) -> Option<&mut SavingsGoal> {
        self.goals.iter_mut().find(|goal| goal.id == id)
    }

    /// Finds the goal sharing `name` and `category`, ignoring case.
    pub fn find_goal(&self, name: &str, category: &str) -> Option<&SavingsGoal> {
        self.goals.iter().find(|goal| goal.matches(name, category))
    }

    pub fn remove_goal(&mut self, id: Uuid) -> Option<SavingsGoal> {
        let index = self.goals.iter().position(|goal| goal.id == id)?;
        Some(self.goals.remove(index))
    }

    /// Records a movement at the head of the history.
    pub fn record(&mut self, movement: Movement) {
        self.movements.insert(0, movement);
    }

    /// Sum of the amounts accumulated across all goals.
    pub fn saved_across_goals(&self) -> Amount {
        self.goals
            .iter()
            .fold(0, |total: Amount, goal| total.saturating_add(goal.accumulated))
    }

    /// Available cash plus everything set aside in goals.
    pub fn net_worth(&self) -> Amount {
        self.available_cash.saturating_add(self.total_saved)
    }

    pub fn is_empty(&self) -> bool {
        self.available_cash == 0
            && self.total_saved == 0
            && self.movements.is_empty()
            && self.goals.is_empty()
    }
}
