use savy_domain::{Amount, LedgerSnapshot};

use crate::CoreError;

pub(crate) fn ensure_positive(amount: Amount) -> Result<(), CoreError> {
    if amount > 0 {
        Ok(())
    } else {
        Err(CoreError::InvalidAmount(amount))
    }
}

pub(crate) fn ensure_target(target: Amount) -> Result<(), CoreError> {
    if target > 0 {
        Ok(())
    } else {
        Err(CoreError::InvalidGoalTarget(target))
    }
}

pub(crate) fn ensure_funds(snapshot: &LedgerSnapshot, amount: Amount) -> Result<(), CoreError> {
    if amount > snapshot.available_cash {
        return Err(CoreError::InsufficientFunds {
            requested: amount,
            available: snapshot.available_cash,
        });
    }
    Ok(())
}
