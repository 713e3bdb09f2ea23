use savy_core::SummaryService;

use crate::cli::{
    commands::expect_args,
    context::ShellContext,
    error::CommandResult,
    format, output,
    registry::CommandEntry,
};

const SAVE_USAGE: &str = "save <amount> <target> <category> [name]";
const CONTRIBUTE_USAGE: &str = "contribute <goal> <amount>";
const WITHDRAW_USAGE: &str = "withdraw <goal> <amount>";
const EDIT_USAGE: &str = "edit <goal> <target> <category> [name]";
const DELETE_USAGE: &str = "delete <goal>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "save",
            "Move cash into a goal, creating it if needed",
            SAVE_USAGE,
            cmd_save,
        ),
        CommandEntry::new("goals", "List savings goals and progress", "goals", cmd_goals),
        CommandEntry::new(
            "contribute",
            "Add cash to an existing goal",
            CONTRIBUTE_USAGE,
            cmd_contribute,
        ),
        CommandEntry::new(
            "withdraw",
            "Return money from a goal to cash",
            WITHDRAW_USAGE,
            cmd_withdraw,
        ),
        CommandEntry::new(
            "edit",
            "Change a goal's target, category or name",
            EDIT_USAGE,
            cmd_edit,
        ),
        CommandEntry::new(
            "delete",
            "Delete a goal and return its balance to cash",
            DELETE_USAGE,
            cmd_delete,
        ),
    ]
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 3, 4, SAVE_USAGE)?;
    let amount = format::parse_amount(args[0])?;
    let target = format::parse_amount(args[1])?;
    let category = args[2];
    let name = args.get(3).copied().unwrap_or("");

    let snapshot = context
        .engine
        .add_savings_goal(category, name, target, amount)?;
    output::success(format!(
        "Saved {}. Total saved: {}",
        context.money(amount),
        context.money(snapshot.total_saved)
    ));
    context.accept(snapshot);
    Ok(())
}

fn cmd_goals(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summaries = SummaryService::goal_summaries(context.snapshot());
    if summaries.is_empty() {
        output::info("No savings goals yet. Use `save` to start one.");
        return Ok(());
    }
    output::section("Goals");
    for goal in summaries {
        println!(
            "  {}  {} ({})",
            format::short_id(goal.id),
            goal.name,
            goal.category
        );
        println!(
            "      {} {} of {}, {} to go",
            format::progress_bar(goal.progress_percent),
            context.money(goal.accumulated),
            context.money(goal.target),
            context.money(goal.remaining)
        );
    }
    Ok(())
}

fn cmd_contribute(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 2, 2, CONTRIBUTE_USAGE)?;
    let goal_id = context.resolve_goal(args[0])?;
    let amount = format::parse_amount(args[1])?;
    let snapshot = context.engine.contribute_to_goal(goal_id, amount)?;
    if let Some(goal) = snapshot.goal(goal_id) {
        output::success(format!(
            "Added {} to {}. Progress: {}%",
            context.money(amount),
            goal.name,
            goal.progress_percent()
        ));
    }
    context.accept(snapshot);
    Ok(())
}

fn cmd_withdraw(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 2, 2, WITHDRAW_USAGE)?;
    let goal_id = context.resolve_goal(args[0])?;
    let amount = format::parse_amount(args[1])?;
    let snapshot = context.engine.withdraw_from_goal(goal_id, amount)?;
    match snapshot.goal(goal_id) {
        Some(goal) => output::success(format!(
            "Withdrew {} from {}. Left in goal: {}",
            context.money(amount),
            goal.name,
            context.money(goal.accumulated)
        )),
        None => output::success(format!(
            "Withdrew {}. The goal is empty and was removed.",
            context.money(amount)
        )),
    }
    context.accept(snapshot);
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 3, 4, EDIT_USAGE)?;
    let goal_id = context.resolve_goal(args[0])?;
    let target = format::parse_amount(args[1])?;
    let category = args[2];
    let name = args.get(3).copied().unwrap_or("");

    let snapshot = context.engine.edit_goal(goal_id, category, name, target)?;
    if let Some(goal) = snapshot.goal(goal_id) {
        output::success(format!(
            "Goal {} updated: {} ({}), target {}",
            format::short_id(goal_id),
            goal.name,
            goal.category,
            context.money(goal.target)
        ));
    }
    context.accept(snapshot);
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, DELETE_USAGE)?;
    let goal_id = context.resolve_goal(args[0])?;
    let label = context
        .snapshot()
        .goal(goal_id)
        .map(|goal| format!("{} ({})", goal.name, context.money(goal.accumulated)))
        .unwrap_or_else(|| format::short_id(goal_id));

    if !context.confirm(&format!("Delete goal {}? Its balance returns to cash.", label))? {
        output::info("Delete cancelled.");
        return Ok(());
    }

    let snapshot = context.engine.delete_goal(goal_id)?;
    output::success(format!(
        "Deleted {}. Available: {}",
        label,
        context.money(snapshot.available_cash)
    ));
    context.accept(snapshot);
    Ok(())
}
