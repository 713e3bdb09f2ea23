use savy_domain::Amount;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Amount),
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },
    #[error("Goal overfunded: requested {requested}, remaining to target {remaining}")]
    GoalOverfunded { requested: Amount, remaining: Amount },
    #[error("Insufficient goal balance: requested {requested}, accumulated {accumulated}")]
    InsufficientGoalBalance {
        requested: Amount,
        accumulated: Amount,
    },
    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),
    #[error("Invalid goal target: {0} (must be greater than zero)")]
    InvalidGoalTarget(Amount),
    #[error("Corrupted snapshot: {0}")]
    CorruptedSnapshot(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl CoreError {
    /// Returns `true` for rejections the caller can fix by changing its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_)
                | CoreError::InsufficientFunds { .. }
                | CoreError::GoalOverfunded { .. }
                | CoreError::InsufficientGoalBalance { .. }
                | CoreError::GoalNotFound(_)
                | CoreError::InvalidGoalTarget(_)
        )
    }
}
