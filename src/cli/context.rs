//! Shared runtime state for the shell: configuration, the engine and the
//! snapshot currently on screen.

use std::sync::Arc;

use dialoguer::{theme::ColorfulTheme, Confirm};
use savy_config::{Config, ConfigManager};
use savy_core::{LedgerEngine, Subscription};
use savy_domain::LedgerSnapshot;
use savy_storage_json::JsonFileStore;
use uuid::Uuid;

use crate::cli::{
    commands,
    error::{CliError, CommandError, LoopControl},
    format,
    output::{self, OutputPreferences},
    registry::{CommandEntry, CommandRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config: Config,
    pub engine: LedgerEngine,
    pub store: JsonFileStore,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
    subscription: Subscription,
    snapshot: LedgerSnapshot,
}

impl ShellContext {
    /// Loads configuration from the data directory and opens its ledger.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = Config::default().resolve_data_dir();
        let config = ConfigManager::with_base_dir(base)?.load()?;
        crate::init_with_filter(&config.log_filter);
        Self::with_config(mode, config)
    }

    pub fn with_config(mode: CliMode, config: Config) -> Result<Self, CliError> {
        output::set_preferences(OutputPreferences {
            color_enabled: config.ui_color_enabled,
        });

        let store = JsonFileStore::new(config.resolve_data_dir())?;
        let engine = LedgerEngine::new(Arc::new(store.clone()));
        let mut subscription = engine.subscribe();
        let snapshot = engine.load()?;
        subscription.poll();
        tracing::debug!(path = %store.snapshot_path().display(), "ledger opened");

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            registry,
            config,
            engine,
            store,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
            subscription,
            snapshot,
        })
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    /// Re-reads the snapshot when another view has saved since the last look.
    pub fn refresh(&mut self) -> Result<(), CommandError> {
        if self.subscription.poll() {
            self.snapshot = self.engine.load()?;
            tracing::debug!("snapshot refreshed after change notification");
        }
        Ok(())
    }

    /// Keeps the snapshot returned by a successful mutation.
    pub fn accept(&mut self, snapshot: LedgerSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub fn money(&self, amount: savy_domain::Amount) -> String {
        format::format_amount(amount, &self.config.currency)
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        format!("savy [{}]> ", self.money(self.snapshot.available_cash))
    }

    /// Resolves a full goal id or an unambiguous prefix of one.
    pub fn resolve_goal(&self, input: &str) -> Result<Uuid, CommandError> {
        if let Ok(id) = Uuid::parse_str(input) {
            return Ok(id);
        }
        let needle = input.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(CommandError::InvalidArguments("goal id is required".into()));
        }
        let matches: Vec<Uuid> = self
            .snapshot
            .goals
            .iter()
            .map(|goal| goal.id)
            .filter(|id| id.simple().to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(CommandError::InvalidArguments(format!(
                "no goal matches `{}`; run `goals` to list them",
                input
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "`{}` matches {} goals; type more of the id",
                input,
                matches.len()
            ))),
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        self.refresh()?;
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.registry.suggest(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    /// Asks for confirmation in interactive mode; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(CommandError::from)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()?)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(core) => {
                output::error(format::describe_error(&core, self.currency()));
            }
            other => output::error(other),
        }
    }
}
