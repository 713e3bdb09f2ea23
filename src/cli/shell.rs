//! The read-dispatch loop behind `savy_cli`.
//!
//! Lines come from a [`LineSource`]: the line editor when a person is at the
//! keyboard, stdin when `SAVY_CLI_SCRIPT` is set. Both feed the same loop, so a
//! script behaves exactly like typing the same commands.

use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::{
    context::{CliMode, ShellContext},
    error::{CliError, CommandError, LoopControl},
    output,
};

/// Environment variable that switches the shell to reading commands from stdin.
pub const SCRIPT_MODE_ENV: &str = "SAVY_CLI_SCRIPT";

const COMMENT_MARKER: char = '#';

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_MODE_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => {
            let mut source = EditorLines::new(&context)?;
            output::info("Type `help` to see available commands.");
            run_loop(&mut context, &mut source)
        }
        CliMode::Script => {
            let stdin = io::stdin();
            run_loop(&mut context, &mut ScriptLines::new(stdin.lock()))
        }
    }
}

/// What a line source produced for one prompt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or end of the script.
    Closed,
}

pub(crate) trait LineSource {
    fn next_line(&mut self, prompt: &str) -> Result<Input, CliError>;

    /// Called with every non-blank line before it is dispatched.
    fn remember(&mut self, _line: &str) {}
}

pub(crate) struct ScriptLines<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> ScriptLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptLines<R> {
    fn next_line(&mut self, _prompt: &str) -> Result<Input, CliError> {
        match self.lines.next() {
            Some(line) => Ok(Input::Line(line?)),
            None => Ok(Input::Closed),
        }
    }
}

struct EditorLines {
    editor: Editor<CommandHelper, DefaultHistory>,
}

impl EditorLines {
    fn new(context: &ShellContext) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandHelper::new(context.command_names())));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(Self { editor })
    }
}

impl LineSource for EditorLines {
    fn next_line(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err.into()),
        }
    }

    fn remember(&mut self, line: &str) {
        self.editor.add_history_entry(line).ok();
    }
}

/// Reads and dispatches lines until the source closes or a command asks to exit.
///
/// The snapshot is refreshed before every prompt so the cash shown in it
/// reflects saves made by other views.
pub(crate) fn run_loop(
    context: &mut ShellContext,
    source: &mut dyn LineSource,
) -> Result<(), CliError> {
    while context.running {
        if let Err(err) = context.refresh() {
            context.report_error(err);
        }
        let prompt = context.prompt();
        match source.next_line(&prompt)? {
            Input::Line(line) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                    continue;
                }
                source.remember(line);
                if let Err(err) = handle_line(context, line) {
                    context.report_error(err);
                }
            }
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Input::Closed => {
                if context.mode == CliMode::Interactive {
                    output::info("Exiting shell.");
                }
                break;
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.to_string());

    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Splits a command line with shell quoting, so `save 100 500 "Viaje familiar"`
/// keeps the goal name together.
pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, String> {
    shell_words::split(input).map_err(|err| format!("could not parse input: {err}"))
}

/// Completes the command word from the registry; arguments are free text.
struct CommandHelper {
    commands: Vec<&'static str>,
}

impl CommandHelper {
    fn new(mut commands: Vec<&'static str>) -> Self {
        commands.sort_unstable();
        commands.dedup();
        Self { commands }
    }

    fn candidates(&self, word: &str) -> Vec<Pair> {
        let word = word.to_ascii_lowercase();
        self.commands
            .iter()
            .filter(|name| name.starts_with(&word))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let start = typed.len() - typed.trim_start().len();
        let word = &typed[start..];
        if word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        Ok((start, self.candidates(word)))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use savy_config::Config;

    #[test]
    fn parses_quoted_arguments() {
        let tokens = parse_command_line(r#"save 100 500 "Viaje familiar" 'Mar 2026'"#).unwrap();
        assert_eq!(
            tokens,
            vec!["save", "100", "500", "Viaje familiar", "Mar 2026"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line("income 10 \"Salario").is_err());
    }

    #[test]
    fn only_the_command_word_completes() {
        let helper = CommandHelper::new(vec!["expense", "export", "exit", "income", "export"]);
        let names: Vec<String> = helper
            .candidates("EXP")
            .into_iter()
            .map(|pair| pair.replacement)
            .collect();
        assert_eq!(names, vec!["expense", "export"]);
    }

    #[test]
    fn script_stops_at_exit_and_skips_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ui_color_enabled: false,
            ..Config::default()
        };
        let mut context = ShellContext::with_config(CliMode::Script, config).expect("shell");
        let script = "# monthly pay\nincome 100 Salario\n\n  \nexit\nincome 5 Salario\n";

        run_loop(&mut context, &mut ScriptLines::new(script.as_bytes())).expect("run");
        assert!(!context.running);
        assert_eq!(context.snapshot().available_cash, 100);
        assert_eq!(context.last_command.as_deref(), Some("exit"));
    }
}
