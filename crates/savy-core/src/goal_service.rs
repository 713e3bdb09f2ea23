//! Business logic for savings goals.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use savy_domain::{
    normalize_label, resolve_goal_name, Amount, LedgerSnapshot, Movement, MovementKind,
    SavingsGoal,
};

use crate::{
    validation::{ensure_funds, ensure_positive, ensure_target},
    CoreError,
};

/// Validated helpers that move money between available cash and savings goals.
///
/// Every helper validates fully before touching the snapshot, so a rejected
/// call leaves it exactly as it was.
pub struct GoalService;

impl GoalService {
    /// Saves `amount` toward the goal named by (`name`, `category`), creating it
    /// when no goal with that pair exists yet. Returns the goal identifier.
    pub fn add_savings_goal(
        snapshot: &mut LedgerSnapshot,
        category: &str,
        name: &str,
        target: Amount,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        ensure_positive(amount)?;
        ensure_funds(snapshot, amount)?;
        ensure_target(target)?;

        let category = normalize_label(category);
        let name = resolve_goal_name(name, &category);
        let balances = Balances::after_saving(snapshot, amount)?;
        let existing = snapshot
            .goals
            .iter()
            .position(|goal| goal.matches(&name, &category));
        let goal_id = match existing {
            Some(index) => {
                let goal = &mut snapshot.goals[index];
                goal.accumulated = goal
                    .accumulated
                    .checked_add(amount)
                    .ok_or(CoreError::InvalidAmount(amount))?;
                goal.target = target;
                goal.touch(now);
                goal.id
            }
            None => {
                let goal = SavingsGoal::new(category, name.clone(), target, amount, now);
                let id = goal.id;
                snapshot.goals.push(goal);
                id
            }
        };

        balances.record(snapshot, MovementKind::SavingsContribution, amount, name, now);
        Ok(goal_id)
    }

    /// Adds `amount` to an existing goal without overshooting its target.
    pub fn contribute(
        snapshot: &mut LedgerSnapshot,
        goal_id: Uuid,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        ensure_positive(amount)?;
        let balances = Balances::after_saving(snapshot, amount);
        let available = snapshot.available_cash;
        let goal = snapshot
            .goal_mut(goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?;
        if amount > available {
            return Err(CoreError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        let remaining = goal.remaining();
        if amount > remaining {
            return Err(CoreError::GoalOverfunded {
                requested: amount,
                remaining,
            });
        }
        let balances = balances?;
        let accumulated = goal
            .accumulated
            .checked_add(amount)
            .ok_or(CoreError::InvalidAmount(amount))?;

        goal.accumulated = accumulated;
        goal.touch(now);
        let label = goal.name.clone();
        balances.record(snapshot, MovementKind::SavingsContribution, amount, label, now);
        Ok(())
    }

    /// Returns `amount` from a goal to available cash. A goal drained to zero is
    /// removed; the return value tells whether that happened.
    pub fn withdraw(
        snapshot: &mut LedgerSnapshot,
        goal_id: Uuid,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        ensure_positive(amount)?;
        let balances = Balances::after_withdrawing(snapshot, amount);
        let goal = snapshot
            .goal_mut(goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?;
        if amount > goal.accumulated {
            return Err(CoreError::InsufficientGoalBalance {
                requested: amount,
                accumulated: goal.accumulated,
            });
        }
        let balances = balances?;

        goal.accumulated -= amount;
        goal.touch(now);
        let label = goal.name.clone();
        let drained = goal.accumulated == 0;
        if drained {
            snapshot.remove_goal(goal_id);
        }
        balances.record(snapshot, MovementKind::SavingsWithdrawal, amount, label, now);
        Ok(drained)
    }

    /// Removes a goal, returning whatever it held to available cash.
    pub fn delete(
        snapshot: &mut LedgerSnapshot,
        goal_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SavingsGoal, CoreError> {
        let held = snapshot
            .goal(goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?
            .accumulated;
        let balances = if held > 0 {
            Some(Balances::after_withdrawing(snapshot, held)?)
        } else {
            None
        };

        let goal = snapshot
            .remove_goal(goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?;
        if let Some(balances) = balances {
            let label = goal.name.clone();
            balances.record(snapshot, MovementKind::SavingsWithdrawal, held, label, now);
        }
        Ok(goal)
    }

    /// Updates the descriptive fields and target of a goal in place.
    pub fn edit(
        snapshot: &mut LedgerSnapshot,
        goal_id: Uuid,
        category: &str,
        name: &str,
        target: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let goal = snapshot
            .goal_mut(goal_id)
            .ok_or(CoreError::GoalNotFound(goal_id))?;
        ensure_target(target)?;

        let category = normalize_label(category);
        goal.name = resolve_goal_name(name, &category);
        goal.category = category;
        goal.target = target;
        goal.touch(now);
        Ok(())
    }
}

/// Cash and saved totals after a transfer, computed before anything is mutated.
#[derive(Debug, Clone, Copy)]
struct Balances {
    cash: Amount,
    saved: Amount,
}

impl Balances {
    fn after_saving(snapshot: &LedgerSnapshot, amount: Amount) -> Result<Self, CoreError> {
        let cash = snapshot.available_cash.checked_sub(amount);
        let saved = snapshot.total_saved.checked_add(amount);
        Self::checked(cash, saved, amount)
    }

    fn after_withdrawing(snapshot: &LedgerSnapshot, amount: Amount) -> Result<Self, CoreError> {
        let cash = snapshot.available_cash.checked_add(amount);
        let saved = snapshot
            .total_saved
            .checked_sub(amount)
            .map(|saved| saved.max(0));
        Self::checked(cash, saved, amount)
    }

    fn checked(
        cash: Option<Amount>,
        saved: Option<Amount>,
        amount: Amount,
    ) -> Result<Self, CoreError> {
        match (cash, saved) {
            (Some(cash), Some(saved)) => Ok(Self { cash, saved }),
            _ => Err(CoreError::InvalidAmount(amount)),
        }
    }

    fn record(
        self,
        snapshot: &mut LedgerSnapshot,
        kind: MovementKind,
        amount: Amount,
        label: String,
        now: DateTime<Utc>,
    ) {
        snapshot.available_cash = self.cash;
        snapshot.total_saved = self.saved;
        snapshot.record(Movement::new(kind, amount, label, now));
    }
}
