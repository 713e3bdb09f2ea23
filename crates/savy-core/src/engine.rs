//! Stable, public-facing ledger operations.
//!
//! Every mutation follows the same shape: load the current snapshot, validate,
//! compute the next snapshot, persist it, and hand it back. A rejected
//! operation returns before anything is written.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use savy_domain::{Amount, LedgerSnapshot};

use crate::{
    cash_service::CashService,
    goal_service::GoalService,
    notify::Subscription,
    persistence::PersistenceAdapter,
    storage::SnapshotStore,
    summary_service::{MonthlyTotals, SummaryService},
    time::{Clock, SystemClock},
    CoreError,
};

/// Owns the ledger operations for one snapshot store.
///
/// Read-modify-write cycles are not serialized: two engines mutating the same
/// store concurrently can lose one update (last write wins).
#[derive(Clone)]
pub struct LedgerEngine {
    adapter: PersistenceAdapter,
    clock: Arc<dyn Clock>,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_clock(PersistenceAdapter::new(store), Arc::new(SystemClock))
    }

    pub fn with_clock(adapter: PersistenceAdapter, clock: Arc<dyn Clock>) -> Self {
        Self { adapter, clock }
    }

    pub fn adapter(&self) -> &PersistenceAdapter {
        &self.adapter
    }

    /// Registers a view for change notifications.
    pub fn subscribe(&self) -> Subscription {
        self.adapter.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn load(&self) -> Result<LedgerSnapshot, CoreError> {
        self.adapter.load()
    }

    /// Income and expense totals for the stored movements in `reference`'s month.
    pub fn monthly_totals<Tz: TimeZone>(
        &self,
        reference: &DateTime<Tz>,
    ) -> Result<MonthlyTotals, CoreError> {
        let snapshot = self.adapter.load()?;
        Ok(SummaryService::monthly_totals(&snapshot.movements, reference))
    }

    pub fn last_movement_timestamp(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let snapshot = self.adapter.load()?;
        Ok(SummaryService::last_movement_timestamp(&snapshot.movements))
    }

    pub fn add_income(&self, category: &str, amount: Amount) -> Result<LedgerSnapshot, CoreError> {
        self.apply("add_income", amount, |snapshot, now| {
            CashService::add_income(snapshot, category, amount, now).map(drop)
        })
    }

    pub fn add_expense(&self, category: &str, amount: Amount) -> Result<LedgerSnapshot, CoreError> {
        self.apply("add_expense", amount, |snapshot, now| {
            CashService::add_expense(snapshot, category, amount, now).map(drop)
        })
    }

    pub fn add_savings_goal(
        &self,
        category: &str,
        name: &str,
        target: Amount,
        amount: Amount,
    ) -> Result<LedgerSnapshot, CoreError> {
        self.apply("add_savings_goal", amount, |snapshot, now| {
            GoalService::add_savings_goal(snapshot, category, name, target, amount, now).map(drop)
        })
    }

    pub fn contribute_to_goal(
        &self,
        goal_id: Uuid,
        amount: Amount,
    ) -> Result<LedgerSnapshot, CoreError> {
        self.apply("contribute_to_goal", amount, |snapshot, now| {
            GoalService::contribute(snapshot, goal_id, amount, now)
        })
    }

    pub fn withdraw_from_goal(
        &self,
        goal_id: Uuid,
        amount: Amount,
    ) -> Result<LedgerSnapshot, CoreError> {
        self.apply("withdraw_from_goal", amount, |snapshot, now| {
            let drained = GoalService::withdraw(snapshot, goal_id, amount, now)?;
            if drained {
                tracing::info!(%goal_id, "goal drained and removed");
            }
            Ok(())
        })
    }

    pub fn delete_goal(&self, goal_id: Uuid) -> Result<LedgerSnapshot, CoreError> {
        let mut released = 0;
        let snapshot = self.apply("delete_goal", 0, |snapshot, now| {
            released = GoalService::delete(snapshot, goal_id, now)?.accumulated;
            Ok(())
        })?;
        tracing::debug!(%goal_id, released, "goal balance returned to cash");
        Ok(snapshot)
    }

    pub fn edit_goal(
        &self,
        goal_id: Uuid,
        category: &str,
        name: &str,
        target: Amount,
    ) -> Result<LedgerSnapshot, CoreError> {
        self.apply("edit_goal", 0, |snapshot, now| {
            GoalService::edit(snapshot, goal_id, category, name, target, now)
        })
    }

    fn apply<F>(
        &self,
        operation: &'static str,
        amount: Amount,
        mutate: F,
    ) -> Result<LedgerSnapshot, CoreError>
    where
        F: FnOnce(&mut LedgerSnapshot, DateTime<Utc>) -> Result<(), CoreError>,
    {
        let mut next = self.adapter.load()?;
        if let Err(err) = mutate(&mut next, self.clock.now()) {
            tracing::debug!(operation, amount, error = %err, "operation rejected");
            return Err(err);
        }
        self.adapter.save(&next)?;
        tracing::info!(
            operation,
            amount,
            available_cash = next.available_cash,
            total_saved = next.total_saved,
            "ledger updated"
        );
        Ok(next)
    }
}
