use crate::cli::{
    context::ShellContext,
    error::{CommandError, CommandResult},
    help, output,
    registry::CommandEntry,
};
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Savy {}", meta.version));
    output::two_column(&[
        (
            "Build hash",
            format!("{} ({})", meta.git_hash, meta.git_status),
        ),
        ("Built at", meta.timestamp.to_string()),
        ("Target", meta.target.to_string()),
        ("Profile", meta.profile.to_string()),
        ("Rustc", meta.rustc.to_string()),
        (
            "Data file",
            context.store.snapshot_path().display().to_string(),
        ),
    ]);
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
