use chrono::{Local, Utc};
use serde::Serialize;
use savy_core::SummaryService;
use savy_domain::LedgerSnapshot;

use crate::cli::{
    commands::expect_args,
    context::ShellContext,
    error::{CommandError, CommandResult},
    format, output,
    registry::CommandEntry,
};

const DEFAULT_MOVEMENT_LIMIT: usize = 10;

const INCOME_USAGE: &str = "income <amount> <category>";
const EXPENSE_USAGE: &str = "expense <amount> <category>";
const MOVEMENTS_USAGE: &str = "movements [limit]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            "Show balances and this month's totals",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new("income", "Record money coming in", INCOME_USAGE, cmd_income),
        CommandEntry::new("expense", "Record money going out", EXPENSE_USAGE, cmd_expense),
        CommandEntry::new(
            "movements",
            "List the most recent movements",
            MOVEMENTS_USAGE,
            cmd_movements,
        ),
        CommandEntry::new("export", "Print the ledger as JSON", "export", cmd_export),
    ]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = context.snapshot();
    let month = SummaryService::monthly_totals(&snapshot.movements, &Local::now());
    let last = SummaryService::last_movement_timestamp(&snapshot.movements)
        .map(format::format_timestamp)
        .unwrap_or_else(|| "never".into());

    output::section("Summary");
    output::two_column(&[
        ("Available cash", context.money(snapshot.available_cash)),
        ("Total saved", context.money(snapshot.total_saved)),
        ("Net worth", context.money(snapshot.net_worth())),
        ("Income this month", context.money(month.income)),
        ("Expenses this month", context.money(month.expense)),
        ("Net this month", context.money(month.net())),
        ("Goals", snapshot.goals.len().to_string()),
        ("Last movement", last),
    ]);
    Ok(())
}

fn cmd_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 2, 2, INCOME_USAGE)?;
    let amount = format::parse_amount(args[0])?;
    let snapshot = context.engine.add_income(args[1], amount)?;
    output::success(format!(
        "Income of {} recorded. Available: {}",
        context.money(amount),
        context.money(snapshot.available_cash)
    ));
    context.accept(snapshot);
    Ok(())
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 2, 2, EXPENSE_USAGE)?;
    let amount = format::parse_amount(args[0])?;
    let snapshot = context.engine.add_expense(args[1], amount)?;
    output::success(format!(
        "Expense of {} recorded. Available: {}",
        context.money(amount),
        context.money(snapshot.available_cash)
    ));
    context.accept(snapshot);
    Ok(())
}

fn cmd_movements(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, 1, MOVEMENTS_USAGE)?;
    let limit = match args.first() {
        Some(raw) => raw.parse::<usize>().ok().filter(|limit| *limit > 0).ok_or_else(|| {
            CommandError::InvalidArguments("limit must be a positive integer".into())
        })?,
        None => DEFAULT_MOVEMENT_LIMIT,
    };

    let snapshot = context.snapshot();
    if snapshot.movements.is_empty() {
        output::info("No movements recorded yet.");
        return Ok(());
    }
    output::section("Movements");
    output::hint("Amounts show the effect on available cash; * marks savings transfers.");
    for movement in SummaryService::recent_movements(&snapshot.movements, limit) {
        let marker = if movement.kind.is_savings() { "*" } else { " " };
        println!(
            "  {}  {:<20} {:>18}{} {}",
            format::format_timestamp(movement.timestamp),
            movement.kind.to_string(),
            context.money(movement.cash_effect()),
            marker,
            movement.category
        );
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    exported_at: chrono::DateTime<Utc>,
    currency: &'a str,
    state: &'a LedgerSnapshot,
}

fn cmd_export(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let document = ExportDocument {
        exported_at: Utc::now(),
        currency: context.currency(),
        state: context.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
