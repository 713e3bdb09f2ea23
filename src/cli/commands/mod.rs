pub mod goals;
pub mod ledger;
pub mod system;

use crate::cli::{
    error::CommandError,
    registry::{CommandEntry, CommandRegistry},
};

const ROOT_COMMAND_ORDER: &[&str] = &[
    "summary",
    "income",
    "expense",
    "movements",
    "save",
    "goals",
    "contribute",
    "withdraw",
    "edit",
    "delete",
    "export",
    "help",
    "version",
    "exit",
];

pub(crate) fn all_entries() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(ledger::definitions());
    commands.extend(goals::definitions());
    commands.extend(system::definitions());
    commands
}

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let mut entries = all_entries();
    entries.sort_by_key(|entry| {
        ROOT_COMMAND_ORDER
            .iter()
            .position(|name| entry.name.eq_ignore_ascii_case(name))
            .unwrap_or(ROOT_COMMAND_ORDER.len())
    });
    for entry in entries {
        registry.register(entry);
    }
}

/// Fails with the command's usage line unless `args` has between `min` and `max` entries.
pub(crate) fn expect_args(
    args: &[&str],
    min: usize,
    max: usize,
    usage: &str,
) -> Result<(), CommandError> {
    if args.len() < min || args.len() > max {
        return Err(CommandError::InvalidArguments(format!("usage: {}", usage)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordered_command_is_registered() {
        let mut registry = CommandRegistry::new();
        register_all(&mut registry);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ROOT_COMMAND_ORDER);
    }

    #[test]
    fn argument_counts_are_checked() {
        assert!(expect_args(&["1"], 1, 2, "x").is_ok());
        assert!(matches!(
            expect_args(&[], 1, 2, "income <amount> <category>"),
            Err(CommandError::InvalidArguments(message)) if message.contains("income <amount>")
        ));
    }
}
