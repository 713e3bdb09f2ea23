//! Immutable records of ledger events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Enumerates the kinds of events a movement can record.
pub enum MovementKind {
    Income,
    Expense,
    SavingsContribution,
    SavingsWithdrawal,
}

impl MovementKind {
    /// Returns `true` for movements that shift money between cash and goals.
    pub fn is_savings(self) -> bool {
        matches!(
            self,
            MovementKind::SavingsContribution | MovementKind::SavingsWithdrawal
        )
    }

    /// Direction in which this kind moves available cash.
    pub fn cash_sign(self) -> Amount {
        match self {
            MovementKind::Income | MovementKind::SavingsWithdrawal => 1,
            MovementKind::Expense | MovementKind::SavingsContribution => -1,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MovementKind::Income => "Income",
            MovementKind::Expense => "Expense",
            MovementKind::SavingsContribution => "Savings contribution",
            MovementKind::SavingsWithdrawal => "Savings withdrawal",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    pub amount: Amount,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl Movement {
    pub fn new(
        kind: MovementKind,
        amount: Amount,
        category: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            category: category.into(),
            timestamp,
        }
    }

    /// Signed change this movement applied to available cash.
    pub fn cash_effect(&self) -> Amount {
        self.kind.cash_sign() * self.amount
    }
}
