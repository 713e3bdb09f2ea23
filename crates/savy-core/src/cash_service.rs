//! Business logic for income and expense movements.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use savy_domain::{normalize_label, Amount, LedgerSnapshot, Movement, MovementKind};

use crate::{
    validation::{ensure_funds, ensure_positive},
    CoreError,
};

/// Validated helpers that move money into and out of available cash.
pub struct CashService;

impl CashService {
    /// Credits available cash and returns the recorded movement's identifier.
    pub fn add_income(
        snapshot: &mut LedgerSnapshot,
        category: &str,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        ensure_positive(amount)?;
        let available_cash = snapshot
            .available_cash
            .checked_add(amount)
            .filter(|cash| cash.checked_add(snapshot.total_saved).is_some())
            .ok_or(CoreError::InvalidAmount(amount))?;

        snapshot.available_cash = available_cash;
        Ok(record(snapshot, MovementKind::Income, amount, category, now))
    }

    /// Debits available cash; the expense may not exceed what is available.
    pub fn add_expense(
        snapshot: &mut LedgerSnapshot,
        category: &str,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        ensure_positive(amount)?;
        ensure_funds(snapshot, amount)?;

        snapshot.available_cash -= amount;
        Ok(record(snapshot, MovementKind::Expense, amount, category, now))
    }
}

fn record(
    snapshot: &mut LedgerSnapshot,
    kind: MovementKind,
    amount: Amount,
    category: &str,
    now: DateTime<Utc>,
) -> Uuid {
    let movement = Movement::new(kind, amount, normalize_label(category), now);
    let id = movement.id;
    snapshot.record(movement);
    id
}
