//! Read-only views derived from a ledger snapshot.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use uuid::Uuid;

use savy_domain::{Amount, LedgerSnapshot, Movement, MovementKind};

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlyTotals {
    pub income: Amount,
    pub expense: Amount,
}

impl MonthlyTotals {
    pub fn net(&self) -> Amount {
        self.income - self.expense
    }
}

/// Progress snapshot of a single savings goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub accumulated: Amount,
    pub target: Amount,
    pub remaining: Amount,
    pub progress_percent: u8,
}

/// Stateless query helpers over snapshots and movement lists.
pub struct SummaryService;

impl SummaryService {
    /// Sums income and expense movements that fall in the calendar month of
    /// `reference`, read in the reference's own time zone. Savings movements
    /// are ignored.
    pub fn monthly_totals<Tz: TimeZone>(
        movements: &[Movement],
        reference: &DateTime<Tz>,
    ) -> MonthlyTotals {
        let zone = reference.timezone();
        movements
            .iter()
            .fold(MonthlyTotals::default(), |mut totals, movement| {
                let local = movement.timestamp.with_timezone(&zone);
                if local.year() != reference.year() || local.month() != reference.month() {
                    return totals;
                }
                match movement.kind {
                    MovementKind::Income => totals.income += movement.amount,
                    MovementKind::Expense => totals.expense += movement.amount,
                    MovementKind::SavingsContribution | MovementKind::SavingsWithdrawal => {}
                }
                totals
            })
    }

    /// Latest timestamp across all movements, regardless of their stored order.
    pub fn last_movement_timestamp(movements: &[Movement]) -> Option<DateTime<Utc>> {
        movements.iter().map(|movement| movement.timestamp).max()
    }

    /// Newest-first listing, keeping stored order between equal timestamps.
    pub fn recent_movements(movements: &[Movement], limit: usize) -> Vec<&Movement> {
        let mut ordered: Vec<&Movement> = movements.iter().collect();
        ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        ordered.truncate(limit);
        ordered
    }

    pub fn goal_summaries(snapshot: &LedgerSnapshot) -> Vec<GoalSummary> {
        snapshot
            .goals
            .iter()
            .map(|goal| GoalSummary {
                id: goal.id,
                name: goal.name.clone(),
                category: goal.category.clone(),
                accumulated: goal.accumulated,
                target: goal.target,
                remaining: goal.remaining(),
                progress_percent: goal.progress_percent(),
            })
            .collect()
    }
}

/// Shorthand for [`SummaryService::monthly_totals`].
pub fn monthly_totals<Tz: TimeZone>(
    movements: &[Movement],
    reference: &DateTime<Tz>,
) -> MonthlyTotals {
    SummaryService::monthly_totals(movements, reference)
}

/// Shorthand for [`SummaryService::last_movement_timestamp`].
pub fn last_movement_timestamp(movements: &[Movement]) -> Option<DateTime<Utc>> {
    SummaryService::last_movement_timestamp(movements)
}

/// Detects broken invariants and other anomalies within a ledger snapshot.
pub fn snapshot_warnings(snapshot: &LedgerSnapshot) -> Vec<String> {
    let mut warnings = Vec::new();

    let saved = snapshot.saved_across_goals();
    if snapshot.total_saved != saved {
        warnings.push(format!(
            "total saved {} does not match the {} accumulated across goals",
            snapshot.total_saved, saved
        ));
    }
    if snapshot.total_saved < 0 {
        warnings.push(format!("total saved is negative ({})", snapshot.total_saved));
    }

    let mut movement_ids = HashSet::new();
    for movement in &snapshot.movements {
        if movement.amount <= 0 {
            warnings.push(format!(
                "movement {} has non-positive amount {}",
                movement.id, movement.amount
            ));
        }
        if !movement_ids.insert(movement.id) {
            warnings.push(format!("movement id {} is duplicated", movement.id));
        }
    }

    let mut goal_ids = HashSet::new();
    for goal in &snapshot.goals {
        if goal.accumulated < 0 {
            warnings.push(format!(
                "goal {} has negative accumulated amount {}",
                goal.id, goal.accumulated
            ));
        }
        if goal.target <= 0 {
            warnings.push(format!(
                "goal {} has non-positive target {}",
                goal.id, goal.target
            ));
        }
        if !goal_ids.insert(goal.id) {
            warnings.push(format!("goal id {} is duplicated", goal.id));
        }
    }
    warnings
}
