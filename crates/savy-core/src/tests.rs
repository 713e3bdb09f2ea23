use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::{
    engine::LedgerEngine,
    persistence::PersistenceAdapter,
    storage::{MemoryStore, SnapshotStore},
    summary_service::{last_movement_timestamp, monthly_totals, MonthlyTotals},
    time::Clock,
    CoreError,
};
use savy_domain::{Amount, LedgerSnapshot, MovementKind};

/// Clock that advances one minute every time it is read.
struct SteppingClock {
    current: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().expect("clock lock");
        let now = *current;
        *current = now + Duration::minutes(1);
        now
    }
}

/// Store whose writes always fail, as a full browser quota would.
struct FullStore {
    inner: MemoryStore,
}

impl SnapshotStore for FullStore {
    fn read(&self) -> Result<Option<Vec<u8>>, CoreError> {
        self.inner.read()
    }

    fn write(&self, _document: &str) -> Result<(), CoreError> {
        Err(CoreError::Storage("quota exceeded".into()))
    }
}

fn engine_over(store: Arc<MemoryStore>) -> LedgerEngine {
    let start = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
    LedgerEngine::with_clock(
        PersistenceAdapter::new(store),
        Arc::new(SteppingClock::starting_at(start)),
    )
}

fn fresh_engine() -> (LedgerEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (engine_over(store.clone()), store)
}

fn assert_invariants(snapshot: &LedgerSnapshot) {
    assert_eq!(snapshot.total_saved, snapshot.saved_across_goals());
    assert!(snapshot.available_cash >= 0);
    assert!(snapshot.total_saved >= 0);
    assert!(snapshot.goals.iter().all(|goal| goal.accumulated >= 0));
    assert!(snapshot.movements.iter().all(|movement| movement.amount > 0));
}

#[test]
fn full_lifecycle_scenario() {
    let (engine, _store) = fresh_engine();

    let snapshot = engine.add_income("Job", 1_000).unwrap();
    assert_eq!(snapshot.available_cash, 1_000);

    let snapshot = engine.add_expense("Food", 200).unwrap();
    assert_eq!(snapshot.available_cash, 800);

    let snapshot = engine.add_savings_goal("Trip", "Trip", 500, 300).unwrap();
    assert_eq!(snapshot.available_cash, 500);
    assert_eq!(snapshot.total_saved, 300);
    assert_eq!(snapshot.goals.len(), 1);
    let goal = &snapshot.goals[0];
    assert_eq!((goal.accumulated, goal.target), (300, 500));

    let snapshot = engine.withdraw_from_goal(goal.id, 300).unwrap();
    assert!(snapshot.goals.is_empty(), "drained goal is pruned");
    assert_eq!(snapshot.available_cash, 800);
    assert_eq!(snapshot.total_saved, 0);

    let kinds: Vec<MovementKind> = snapshot.movements.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::SavingsWithdrawal,
            MovementKind::SavingsContribution,
            MovementKind::Expense,
            MovementKind::Income,
        ]
    );
    assert_eq!(engine.load().unwrap(), snapshot);
}

#[test]
fn goal_cap_scenario() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 1_000).unwrap();
    let snapshot = engine.add_savings_goal("Trip", "Beach", 500, 500).unwrap();
    let goal_id = snapshot.goals[0].id;
    assert_eq!(snapshot.goals[0].accumulated, 500);

    let err = engine.contribute_to_goal(goal_id, 1).unwrap_err();
    assert!(matches!(
        err,
        CoreError::GoalOverfunded {
            requested: 1,
            remaining: 0
        }
    ));
}

#[test]
fn rejected_expense_leaves_storage_untouched() {
    let (engine, store) = fresh_engine();
    engine.add_income("Job", 50).unwrap();
    let before = store.document().expect("stored snapshot");
    let mut view = engine.subscribe();

    let err = engine.add_expense("Rent", 100).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientFunds {
            requested: 100,
            available: 50
        }
    ));
    assert!(err.is_validation());
    assert_eq!(store.document().expect("stored snapshot"), before);
    assert!(!view.poll(), "rejections do not notify");
}

#[test]
fn every_rejection_kind_is_reported() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 100).unwrap();
    let goal_id = engine.add_savings_goal("Otro", "", 80, 40).unwrap().goals[0].id;
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        engine.add_income("Job", 0),
        Err(CoreError::InvalidAmount(0))
    ));
    assert!(matches!(
        engine.add_savings_goal("Otro", "", 0, 10),
        Err(CoreError::InvalidGoalTarget(0))
    ));
    assert!(matches!(
        engine.contribute_to_goal(goal_id, 61),
        Err(CoreError::InsufficientFunds { .. })
    ));
    assert!(matches!(
        engine.contribute_to_goal(goal_id, 41),
        Err(CoreError::GoalOverfunded { .. })
    ));
    assert!(matches!(
        engine.withdraw_from_goal(goal_id, 41),
        Err(CoreError::InsufficientGoalBalance { .. })
    ));
    assert!(matches!(
        engine.delete_goal(missing),
        Err(CoreError::GoalNotFound(id)) if id == missing
    ));
    assert!(matches!(
        engine.edit_goal(missing, "Otro", "x", 10),
        Err(CoreError::GoalNotFound(_))
    ));
    assert!(matches!(
        engine.edit_goal(goal_id, "Otro", "x", -10),
        Err(CoreError::InvalidGoalTarget(-10))
    ));
}

#[test]
fn delete_goal_conserves_money() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 900).unwrap();
    let snapshot = engine.add_savings_goal("Viaje", "Mar", 700, 350).unwrap();
    let goal_id = snapshot.goals[0].id;
    let net_before = snapshot.net_worth();

    let snapshot = engine.delete_goal(goal_id).unwrap();
    assert_eq!(snapshot.net_worth(), net_before);
    assert_eq!(snapshot.available_cash, 900);
    assert_eq!(snapshot.movements[0].kind, MovementKind::SavingsWithdrawal);
    assert_eq!(snapshot.movements[0].amount, 350);
}

#[test]
fn edit_goal_persists_without_touching_balances() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 900).unwrap();
    let goal_id = engine.add_savings_goal("Viaje", "Mar", 700, 350).unwrap().goals[0].id;

    let snapshot = engine.edit_goal(goal_id, "Estudio", "Maestria", 2_000).unwrap();
    let goal = snapshot.goal(goal_id).unwrap();
    assert_eq!((goal.name.as_str(), goal.category.as_str()), ("Maestria", "Estudio"));
    assert_eq!(goal.target, 2_000);
    assert_eq!((snapshot.available_cash, snapshot.total_saved), (550, 350));
    assert_eq!(engine.load().unwrap(), snapshot);
}

#[test]
fn load_is_idempotent() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 10).unwrap();
    assert_eq!(engine.load().unwrap(), engine.load().unwrap());
}

#[test]
fn clones_act_as_synchronized_views() {
    let (editor, _store) = fresh_engine();
    let viewer = editor.clone();
    let mut view = viewer.subscribe();
    let stale = viewer.load().unwrap();

    editor.add_income("Job", 75).unwrap();
    assert!(view.poll());
    let refreshed = viewer.load().unwrap();
    assert_ne!(refreshed, stale);
    assert_eq!(refreshed.available_cash, 75);
    assert!(!view.poll());
}

#[test]
fn goal_without_timestamp_survives_load_and_later_saves() {
    let store = Arc::new(MemoryStore::with_document(
        r#"{"totalSaved": 300, "goals": [{"id": "5f0c6f4e-8b9a-4a43-9d1e-2f65d1c2a002",
            "category": "Viaje", "name": "Playa", "target": 500, "accumulated": 300}]}"#,
    ));
    let engine = engine_over(store);

    let snapshot = engine.add_income("Job", 50).unwrap();
    assert_eq!(snapshot.goals.len(), 1);
    assert_eq!(snapshot.total_saved, 300);
    assert_eq!(snapshot.total_saved, snapshot.saved_across_goals());
    assert_eq!(engine.load().unwrap(), snapshot);
}

#[test]
fn engines_sharing_only_a_store_see_each_other() {
    let store = Arc::new(MemoryStore::new());
    let editor = engine_over(store.clone());
    let viewer = engine_over(store);
    assert!(viewer.load().unwrap().is_empty());
    let mut view = viewer.subscribe();
    assert!(!view.poll());

    editor.add_income("Job", 100).unwrap();
    assert!(view.poll(), "a save through another engine is a change");
    assert_eq!(viewer.load().unwrap().available_cash, 100);
    assert!(!view.poll());

    editor.add_income("Job", 100).unwrap();
    viewer.add_expense("Food", 30).unwrap();
    let merged = editor.load().unwrap();
    assert_eq!(merged.available_cash, 170);
    assert_eq!(merged.movements.len(), 3);
}

#[test]
fn failed_save_propagates_and_does_not_notify() {
    let store = Arc::new(FullStore {
        inner: MemoryStore::with_document(r#"{"availableCash": 10}"#),
    });
    let adapter = PersistenceAdapter::new(store);
    let mut view = adapter.subscribe();
    let engine = LedgerEngine::with_clock(adapter, Arc::new(crate::time::SystemClock));

    let err = engine.add_income("Job", 5).unwrap_err();
    assert!(matches!(err, CoreError::Storage(ref message) if message.contains("quota")));
    assert!(!err.is_validation());
    assert!(!view.poll());
}

#[test]
fn queries_read_engine_snapshots() {
    let (engine, _store) = fresh_engine();
    engine.add_income("Job", 100).unwrap();
    engine.add_expense("Food", 40).unwrap();
    let snapshot = engine.add_savings_goal("Viaje", "", 100, 30).unwrap();

    let reference = Utc.with_ymd_and_hms(2025, 1, 25, 0, 0, 0).unwrap();
    assert_eq!(
        monthly_totals(&snapshot.movements, &reference),
        MonthlyTotals {
            income: 100,
            expense: 40
        }
    );
    assert_eq!(
        last_movement_timestamp(&snapshot.movements),
        Some(Utc.with_ymd_and_hms(2025, 1, 10, 8, 2, 0).unwrap())
    );
    assert_eq!(
        engine.monthly_totals(&reference).unwrap(),
        monthly_totals(&snapshot.movements, &reference)
    );
    assert_eq!(
        engine.last_movement_timestamp().unwrap(),
        last_movement_timestamp(&snapshot.movements)
    );

    let next_month = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
    assert_eq!(engine.monthly_totals(&next_month).unwrap(), MonthlyTotals::default());
}

#[derive(Debug, Clone)]
enum Op {
    Income(Amount),
    Expense(Amount),
    Save(u8, Amount, Amount),
    Contribute(usize, Amount),
    Withdraw(usize, Amount),
    Delete(usize),
    Edit(usize, Amount),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i64..5_000).prop_map(Op::Income),
        (1i64..3_000).prop_map(Op::Expense),
        (0u8..3, 1i64..2_000, 1i64..1_500).prop_map(|(slot, target, amount)| Op::Save(
            slot, target, amount
        )),
        (0usize..4, 1i64..800).prop_map(|(index, amount)| Op::Contribute(index, amount)),
        (0usize..4, 1i64..800).prop_map(|(index, amount)| Op::Withdraw(index, amount)),
        (0usize..4).prop_map(Op::Delete),
        (0usize..4, 1i64..3_000).prop_map(|(index, target)| Op::Edit(index, target)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Totals stay consistent and money is only created by income and destroyed by expenses.
    #[test]
    fn prop_operations_preserve_invariants(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let (engine, store) = fresh_engine();
        let mut current = engine.load().unwrap();

        for op in ops {
            let goal_at = |index: usize| current.goals.get(index % current.goals.len().max(1)).map(|goal| goal.id);
            let movements_before = current.movements.len();
            let net_before = current.net_worth();
            let document_before = store.document();

            let (result, expected_delta) = match op {
                Op::Income(amount) => (engine.add_income("Job", amount), amount),
                Op::Expense(amount) => (engine.add_expense("Food", amount), -amount),
                Op::Save(slot, target, amount) => {
                    let name = format!("Goal {slot}");
                    (engine.add_savings_goal("Otro", &name, target, amount), 0)
                }
                Op::Contribute(index, amount) => match goal_at(index) {
                    Some(id) => (engine.contribute_to_goal(id, amount), 0),
                    None => continue,
                },
                Op::Withdraw(index, amount) => match goal_at(index) {
                    Some(id) => (engine.withdraw_from_goal(id, amount), 0),
                    None => continue,
                },
                Op::Delete(index) => match goal_at(index) {
                    Some(id) => (engine.delete_goal(id), 0),
                    None => continue,
                },
                Op::Edit(index, target) => match goal_at(index) {
                    Some(id) => (engine.edit_goal(id, "Otro", "", target), 0),
                    None => continue,
                },
            };

            match result {
                Ok(next) => {
                    assert_invariants(&next);
                    prop_assert_eq!(next.net_worth() - net_before, expected_delta);
                    prop_assert!(next.movements.len() >= movements_before);
                    current = next;
                }
                Err(err) => {
                    prop_assert!(err.is_validation(), "unexpected failure: {}", err);
                    prop_assert_eq!(store.document(), document_before);
                }
            }
        }
    }
}
