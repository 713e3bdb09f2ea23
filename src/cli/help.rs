use crate::cli::{
    output,
    registry::{CommandEntry, CommandRegistry},
};

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    let rows: Vec<(&str, String)> = registry
        .list()
        .into_iter()
        .map(|entry| (entry.name, entry.description.to_string()))
        .collect();
    output::two_column(&rows);
    output::hint("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    output::two_column(&[
        ("description", entry.description.to_string()),
        ("usage", entry.usage.to_string()),
    ]);
}
