//! Built-in commands handled in-process, ahead of executable resolution.
//!
//! Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
//! directly without spawning a child process. The dispatcher tells the main
//! loop how the line was handled, which decides whether the loop keeps
//! going and whether the line is recorded in history.

use crate::env::Environment;
use crate::history::HistoryStore;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::env as stdenv;
use std::io::Write;
use std::path::PathBuf;

/// What the dispatcher did with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// The command name is not a built-in; resolve and launch it instead.
    NotBuiltin,
    /// `exit`: the main loop should terminate.
    Terminate,
    /// The built-in ran but failed (e.g. `cd` to a missing directory).
    /// The loop continues and the line is not recorded in history.
    Failed,
    /// The built-in ran; the line is recorded in history.
    Handled,
}

/// Built-in commands known to the shell at compile time.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Names this command answers to, e.g. `["history", "h"]`.
    fn names() -> &'static [&'static str];

    /// Executes the command against the provided output sink and state.
    fn execute(
        self,
        out: &mut dyn Write,
        env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<BuiltinOutcome>;
}

/// Run `tokens` as a built-in if its name matches one, reporting how it went.
///
/// Only a [`BuiltinOutcome::NotBuiltin`] result should proceed to
/// redirection, path resolution and process launch.
pub fn dispatch(
    tokens: &[String],
    env: &mut Environment,
    history: &HistoryStore,
    out: &mut dyn Write,
) -> Result<BuiltinOutcome> {
    type TryRun = fn(
        &[String],
        &mut dyn Write,
        &mut Environment,
        &HistoryStore,
    ) -> Option<Result<BuiltinOutcome>>;

    const BUILTINS: &[TryRun] = &[
        try_run::<Exit>,
        try_run::<History>,
        try_run::<Pwd>,
        try_run::<Cd>,
    ];

    for try_builtin in BUILTINS {
        if let Some(outcome) = try_builtin(tokens, out, env, history) {
            return outcome;
        }
    }
    Ok(BuiltinOutcome::NotBuiltin)
}

/// Parse and run one builtin, or `None` if the name is not its.
fn try_run<T: BuiltinCommand>(
    tokens: &[String],
    out: &mut dyn Write,
    env: &mut Environment,
    history: &HistoryStore,
) -> Option<Result<BuiltinOutcome>> {
    let name = tokens.first()?.as_str();
    if !T::names().contains(&name) {
        return None;
    }
    let args: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();
    Some(match T::from_args(&[name], &args) {
        Ok(cmd) => cmd.execute(out, env, history),
        Err(EarlyExit { output, status }) => {
            // argh produced either a help screen or a usage complaint.
            writeln!(out, "{}", output.trim_end())
                .map(|_| match status {
                    Ok(()) => BuiltinOutcome::Handled,
                    Err(()) => BuiltinOutcome::Failed,
                })
                .map_err(Into::into)
        }
    })
}

#[derive(FromArgs)]
/// Terminate the shell, saving command history.
struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits with a success status.
    _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn names() -> &'static [&'static str] {
        &["exit"]
    }

    fn execute(
        self,
        _out: &mut dyn Write,
        _env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<BuiltinOutcome> {
        Ok(BuiltinOutcome::Terminate)
    }
}

#[derive(FromArgs)]
/// List the recorded command lines with their sequence numbers.
struct History {}

impl BuiltinCommand for History {
    fn names() -> &'static [&'static str] {
        &["h", "history"]
    }

    fn execute(
        self,
        out: &mut dyn Write,
        _env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<BuiltinOutcome> {
        history.show(out)?;
        Ok(BuiltinOutcome::Handled)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
struct Pwd {}

impl BuiltinCommand for Pwd {
    fn names() -> &'static [&'static str] {
        &["pwd"]
    }

    fn execute(
        self,
        out: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<BuiltinOutcome> {
        writeln!(out, "{}", env.current_dir.display())?;
        Ok(BuiltinOutcome::Handled)
    }
}

#[derive(FromArgs)]
/// Change the current working directory and print the new one.
/// With no target, changes to the directory named by HOME.
struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, or relative to the current
    /// directory. Defaults to $HOME when omitted.
    target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn names() -> &'static [&'static str] {
        &["cd"]
    }

    fn execute(
        self,
        out: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<BuiltinOutcome> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.home() {
                Some(home) => home,
                None => {
                    writeln!(out, "cd: HOME not set")?;
                    return Ok(BuiltinOutcome::Failed);
                }
            },
        };

        let new_dir = if target.is_absolute() {
            target.clone()
        } else {
            env.current_dir.join(&target)
        };

        // The process-wide working directory must follow along so that
        // relative paths in later lines (globs, redirect targets) resolve
        // against the directory the user sees.
        if !new_dir.is_dir() || stdenv::set_current_dir(&new_dir).is_err() {
            writeln!(out, "{}: No such file or directory", target.display())?;
            return Ok(BuiltinOutcome::Failed);
        }
        env.current_dir = new_dir;
        writeln!(out, "{}", env.current_dir.display())?;
        Ok(BuiltinOutcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_CAPACITY;

    fn run(line: &[&str], env: &mut Environment, history: &HistoryStore) -> (BuiltinOutcome, String) {
        let tokens: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let outcome = dispatch(&tokens, env, history, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn empty_history() -> HistoryStore {
        HistoryStore::new(HISTORY_CAPACITY)
    }

    #[test]
    fn unknown_names_are_not_builtins() {
        let mut env = Environment::new().unwrap();
        let (outcome, output) = run(&["ls", "-l"], &mut env, &empty_history());
        assert_eq!(outcome, BuiltinOutcome::NotBuiltin);
        assert!(output.is_empty());
    }

    #[test]
    fn exit_signals_termination() {
        let mut env = Environment::new().unwrap();
        let (outcome, _) = run(&["exit"], &mut env, &empty_history());
        assert_eq!(outcome, BuiltinOutcome::Terminate);
    }

    #[test]
    fn pwd_prints_the_working_directory() {
        let mut env = Environment::new().unwrap();
        let (outcome, output) = run(&["pwd"], &mut env, &empty_history());
        assert_eq!(outcome, BuiltinOutcome::Handled);
        assert_eq!(output.trim_end(), env.current_dir.display().to_string());
    }

    #[test]
    fn history_and_its_alias_enumerate_the_store() {
        let mut env = Environment::new().unwrap();
        let mut history = empty_history();
        history.append(0, "ls");
        history.append(1, "pwd");

        let (outcome, output) = run(&["history"], &mut env, &history);
        assert_eq!(outcome, BuiltinOutcome::Handled);
        assert_eq!(output, "   0  ls\n   1  pwd\n");

        let (_, alias_output) = run(&["h"], &mut env, &history);
        assert_eq!(alias_output, output);
    }

    #[test]
    fn cd_to_missing_directory_fails_without_aborting() {
        let mut env = Environment::new().unwrap();
        let before = env.current_dir.clone();

        let (outcome, output) = run(&["cd", "no/such/dir"], &mut env, &empty_history());
        assert_eq!(outcome, BuiltinOutcome::Failed);
        assert!(output.contains("No such file or directory"));
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn cd_to_the_current_directory_reports_it() {
        let mut env = Environment::new().unwrap();
        let here = env.current_dir.display().to_string();

        let (outcome, output) = run(&["cd", here.as_str()], &mut env, &empty_history());
        assert_eq!(outcome, BuiltinOutcome::Handled);
        assert_eq!(output.trim_end(), here);
    }
}
