//! Primitive aliases and label helpers shared by ledger entities.

/// Monetary quantity in whole units of the ledger's single currency.
pub type Amount = i64;

/// Trims a free-form label supplied by the user.
pub fn normalize_label(value: &str) -> String {
    value.trim().to_string()
}
