//! Snapshot persistence with self-healing loads and change notification.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use savy_domain::{
    normalize_label, resolve_goal_name, Amount, LedgerSnapshot, Movement, MovementKind,
    SavingsGoal,
};

use crate::{
    notify::{ChangeNotifier, Subscription},
    storage::SnapshotStore,
    summary_service::snapshot_warnings,
    CoreError,
};

/// Loads and saves the single ledger snapshot of a store, announcing every save.
///
/// Cloning the adapter shares both the store and the notifier, so every clone
/// acts as another view of the same snapshot. Adapters that only share the
/// store still notice each other's saves through the store revision.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn SnapshotStore>,
    notifier: ChangeNotifier,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_notifier(store, ChangeNotifier::default())
    }

    pub fn with_notifier(store: Arc<dyn SnapshotStore>, notifier: ChangeNotifier) -> Self {
        Self { store, notifier }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe().watching(self.store.clone())
    }

    /// Returns the stored snapshot, replacing absent or unreadable data with the
    /// empty snapshot. Only storage failures surface as errors.
    pub fn load(&self) -> Result<LedgerSnapshot, CoreError> {
        let Some(document) = self.store.read()? else {
            tracing::info!("no stored snapshot, starting an empty ledger");
            return self.reset();
        };

        let decoded = std::str::from_utf8(&document)
            .map_err(|err| CoreError::CorruptedSnapshot(format!("document is not UTF-8: {err}")))
            .and_then(decode_snapshot);

        match decoded {
            Ok(mut snapshot) => {
                for warning in snapshot_warnings(&snapshot) {
                    tracing::warn!(%warning, "stored snapshot is inconsistent");
                }
                reconcile_total_saved(&mut snapshot);
                Ok(snapshot)
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored snapshot unreadable, resetting to an empty ledger");
                self.store.quarantine(&document)?;
                self.reset()
            }
        }
    }

    /// Persists `snapshot` and notifies every subscriber.
    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), CoreError> {
        let document = encode_snapshot(snapshot)?;
        self.store.write(&document)?;
        let receivers = self.notifier.publish();
        tracing::debug!(receivers, "snapshot saved");
        Ok(())
    }

    fn reset(&self) -> Result<LedgerSnapshot, CoreError> {
        let empty = LedgerSnapshot::empty();
        self.save(&empty)?;
        Ok(empty)
    }
}

/// Goals are the source of truth for the saved total.
fn reconcile_total_saved(snapshot: &mut LedgerSnapshot) {
    let across_goals = snapshot.saved_across_goals();
    if snapshot.total_saved != across_goals {
        tracing::warn!(
            stored = snapshot.total_saved,
            across_goals,
            "recomputing total saved from goals"
        );
        snapshot.total_saved = across_goals;
    }
}

pub fn encode_snapshot(snapshot: &LedgerSnapshot) -> Result<String, CoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|err| CoreError::Serde(err.to_string()))
}

/// Decodes a stored document field by field.
///
/// Missing or mistyped numbers become 0, missing or mistyped lists become empty,
/// and list entries keep whatever fields they carry, with defaults for the rest.
/// Entries are dropped only when they are not objects or, for movements, when
/// the kind is unknown. Only documents that are not JSON objects are rejected.
pub fn decode_snapshot(document: &str) -> Result<LedgerSnapshot, CoreError> {
    let value: Value = serde_json::from_str(document)
        .map_err(|err| CoreError::CorruptedSnapshot(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(CoreError::CorruptedSnapshot(
            "top-level value is not an object".into(),
        ));
    };

    Ok(LedgerSnapshot {
        available_cash: amount_field(&fields, "availableCash"),
        total_saved: amount_field(&fields, "totalSaved"),
        movements: list_field(&fields, "movements", decode_movement),
        goals: list_field(&fields, "goals", decode_goal),
    })
}

fn decode_movement(index: usize, fields: &Map<String, Value>) -> Option<Movement> {
    let Some(kind) = fields
        .get("kind")
        .and_then(|kind| MovementKind::deserialize(kind).ok())
    else {
        tracing::warn!(index, "dropping movement with an unknown kind");
        return None;
    };

    Some(Movement {
        id: id_field(fields, "movements", index),
        kind,
        amount: amount_field(fields, "amount"),
        category: normalize_label(&text_field(fields, "category")),
        timestamp: timestamp_field(fields, &["timestamp"]),
    })
}

fn decode_goal(index: usize, fields: &Map<String, Value>) -> Option<SavingsGoal> {
    let category = normalize_label(&text_field(fields, "category"));
    let name = resolve_goal_name(&text_field(fields, "name"), &category);

    Some(SavingsGoal {
        id: id_field(fields, "goals", index),
        name,
        category,
        target: amount_field(fields, "target"),
        accumulated: amount_field(fields, "accumulated"),
        last_updated: timestamp_field(fields, &["timestamp", "lastUpdated"]),
    })
}

fn amount_field(fields: &Map<String, Value>, key: &str) -> Amount {
    match fields.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<Amount>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn truncate(value: f64) -> Option<Amount> {
    if value.is_finite() && value.abs() < Amount::MAX as f64 {
        Some(value.trunc() as Amount)
    } else {
        None
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Uuid ids are kept as stored. Anything else maps to an id derived from the
/// entry itself, so repeated loads of the same document agree on it.
fn id_field(fields: &Map<String, Value>, list: &str, index: usize) -> Uuid {
    if let Some(id) = fields
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
    {
        return id;
    }

    let raw = serde_json::to_string(fields).unwrap_or_default();
    let mut bytes = [0u8; 16];
    for (seed, half) in bytes.chunks_mut(8).enumerate() {
        let mut hasher = DefaultHasher::new();
        (seed, list, index, raw.as_str()).hash(&mut hasher);
        half.copy_from_slice(&hasher.finish().to_le_bytes());
    }
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// RFC 3339 strings or epoch milliseconds; anything else falls back to the epoch.
fn timestamp_field(fields: &Map<String, Value>, keys: &[&str]) -> DateTime<Utc> {
    let parsed = keys
        .iter()
        .filter_map(|key| fields.get(*key))
        .find_map(|value| match value {
            Value::String(text) => text.trim().parse::<DateTime<Utc>>().ok(),
            Value::Number(number) => number
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        });
    parsed.unwrap_or_default()
}

fn list_field<T>(
    fields: &Map<String, Value>,
    key: &str,
    decode: impl Fn(usize, &Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    match fields.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item {
                Value::Object(entry) => decode(index, entry),
                _ => {
                    tracing::warn!(field = key, index, "dropping entry that is not an object");
                    None
                }
            })
            .collect(),
        Some(_) => {
            tracing::warn!(field = key, "expected a list, defaulting to empty");
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn adapter_over(store: Arc<MemoryStore>) -> PersistenceAdapter {
        PersistenceAdapter::new(store)
    }

    #[test]
    fn load_initializes_and_persists_empty_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let adapter = adapter_over(store.clone());
        let mut view = adapter.subscribe();

        let snapshot = adapter.load().expect("load");
        assert!(snapshot.is_empty());
        let stored = store.document().expect("empty snapshot persisted");
        assert_eq!(decode_snapshot(&stored).expect("decode"), snapshot);
        assert!(view.poll(), "initializing the store counts as a change");
    }

    #[test]
    fn unparsable_document_is_quarantined_and_healed() {
        let store = Arc::new(MemoryStore::with_document("{not json"));
        let adapter = adapter_over(store.clone());

        let snapshot = adapter.load().expect("self-healing load");
        assert!(snapshot.is_empty());
        assert_eq!(store.quarantined(), vec![b"{not json".to_vec()]);
        assert_ne!(store.document().as_deref(), Some("{not json"));
    }

    #[test]
    fn non_object_document_counts_as_corrupted() {
        let err = decode_snapshot("[1, 2, 3]").expect_err("arrays are rejected");
        assert!(matches!(err, CoreError::CorruptedSnapshot(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn fields_default_individually() {
        let snapshot = decode_snapshot(
            r#"{"availableCash": "1500", "totalSaved": 12.9, "movements": "oops"}"#,
        )
        .expect("lenient decode");
        assert_eq!(snapshot.available_cash, 1500);
        assert_eq!(snapshot.total_saved, 12);
        assert!(snapshot.movements.is_empty());
        assert!(snapshot.goals.is_empty());
    }

    #[test]
    fn entries_that_cannot_be_read_are_dropped() {
        let document = r#"{
            "availableCash": 10,
            "movements": [
                {"id": "5f0c6f4e-8b9a-4a43-9d1e-2f65d1c2a001", "kind": "Income",
                 "amount": 10, "category": "Job", "timestamp": "2025-01-15T10:00:00Z"},
                {"id": "nope", "kind": "Gift"},
                "not an entry"
            ]
        }"#;
        let snapshot = decode_snapshot(document).expect("lenient decode");
        assert_eq!(snapshot.movements.len(), 1);
        assert_eq!(snapshot.movements[0].category, "Job");
    }

    #[test]
    fn partial_goals_keep_their_money() {
        let document = r#"{
            "totalSaved": 300,
            "goals": [
                {"id": "ahorro-1700000000000", "category": "Viaje", "name": "",
                 "target": "500", "accumulated": 300, "lastUpdated": 1700000000000}
            ]
        }"#;
        let snapshot = decode_snapshot(document).expect("lenient decode");
        assert_eq!(snapshot.goals.len(), 1);
        let goal = &snapshot.goals[0];
        assert_eq!(goal.name, "Viaje");
        assert_eq!(goal.target, 500);
        assert_eq!(goal.accumulated, 300);
        assert_eq!(goal.last_updated.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(snapshot.total_saved, snapshot.saved_across_goals());
    }

    #[test]
    fn derived_ids_are_stable_across_loads() {
        let document = r#"{"goals": [{"id": "ahorro-1", "category": "Viaje", "target": 5},
                                     {"category": "Viaje", "target": 5}]}"#;
        let first = decode_snapshot(document).expect("decode");
        let second = decode_snapshot(document).expect("decode");
        assert_eq!(first, second);
        assert_ne!(first.goals[0].id, first.goals[1].id);
        assert_eq!(first.goals[1].last_updated, DateTime::<Utc>::default());
    }

    #[test]
    fn stored_total_is_recomputed_from_goals() {
        let store = Arc::new(MemoryStore::with_document(
            r#"{"totalSaved": 999, "goals": [{"category": "Viaje", "target": 500, "accumulated": 300}]}"#,
        ));
        let adapter = adapter_over(store);

        let snapshot = adapter.load().expect("load");
        assert_eq!(snapshot.total_saved, 300);
    }

    #[test]
    fn non_utf8_document_is_quarantined_byte_for_byte() {
        let raw = vec![b'{', 0xff, 0xfe, b'}'];
        let store = Arc::new(MemoryStore::with_document(raw.clone()));
        let adapter = adapter_over(store.clone());

        let snapshot = adapter.load().expect("self-healing load");
        assert!(snapshot.is_empty());
        assert_eq!(store.quarantined(), vec![raw]);
        let stored = store.document().expect("empty snapshot persisted");
        assert_eq!(decode_snapshot(&stored).expect("decode"), snapshot);
    }

    #[test]
    fn readable_document_is_not_rewritten_on_load() {
        let store = Arc::new(MemoryStore::with_document(r#"{"availableCash": 7}"#));
        let adapter = adapter_over(store.clone());

        let snapshot = adapter.load().expect("load");
        assert_eq!(snapshot.available_cash, 7);
        assert_eq!(store.document().as_deref(), Some(r#"{"availableCash": 7}"#));
    }
}
