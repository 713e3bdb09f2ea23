//! Presentation helpers: money, identifiers, timestamps and user-facing errors.

use chrono::{DateTime, Local, Utc};
use savy_core::CoreError;
use savy_domain::Amount;
use uuid::Uuid;

use crate::cli::error::CommandError;

const PROGRESS_WIDTH: usize = 20;

/// `$1.500.000 COP`: dot-grouped thousands, whole units.
pub fn format_amount(amount: Amount, currency: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}${grouped} {currency}")
}

pub fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        percent
    )
}

/// Parses a whole amount; `_` and `,` are accepted as digit separators.
/// Sign and range checks are left to the engine.
pub fn parse_amount(input: &str) -> Result<Amount, CommandError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | ','))
        .collect();
    cleaned.parse::<Amount>().map_err(|_| {
        CommandError::InvalidArguments(format!("`{}` is not a whole amount", input))
    })
}

pub fn describe_error(err: &CoreError, currency: &str) -> String {
    let money = |amount: &Amount| format_amount(*amount, currency);
    match err {
        CoreError::InvalidAmount(amount) => {
            format!("Amount must be greater than zero (got {}).", amount)
        }
        CoreError::InsufficientFunds {
            requested,
            available,
        } => format!(
            "Not enough available cash: requested {}, available {}.",
            money(requested),
            money(available)
        ),
        CoreError::GoalOverfunded {
            requested,
            remaining,
        } => format!(
            "That would exceed the goal: requested {}, only {} left to reach the target.",
            money(requested),
            money(remaining)
        ),
        CoreError::InsufficientGoalBalance {
            requested,
            accumulated,
        } => format!(
            "The goal only holds {}; cannot withdraw {}.",
            money(accumulated),
            money(requested)
        ),
        CoreError::GoalNotFound(id) => format!("No goal with id {}.", short_id(*id)),
        CoreError::InvalidGoalTarget(target) => {
            format!("Goal target must be greater than zero (got {}).", target)
        }
        other => format!("Storage problem: {}", other),
    }
}
