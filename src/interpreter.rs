//! The interactive loop: read a line, run it, report, record.

use crate::builtin::{self, BuiltinOutcome};
use crate::env::Environment;
use crate::expand;
use crate::external;
use crate::history::{self, HistoryStore, HISTORY_CAPACITY};
use crate::lexer;
use crate::redirect;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::PathBuf;

const PROMPT: &str = "minish$ ";

/// What the main loop should do after a line has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStatus {
    Continue,
    Exit,
}

/// The shell itself: environment, search path and command history.
///
/// Each interpreter owns an independent [`HistoryStore`], so tests can run
/// several of them in one process without sharing state.
pub struct Interpreter {
    env: Environment,
    search_path: Vec<PathBuf>,
    history: HistoryStore,
    history_path: Option<PathBuf>,
    next_seq: i32,
}

impl Interpreter {
    /// Set up an interpreter from the process environment, loading history
    /// from `~/.minish_history` when present.
    pub fn new() -> Result<Self> {
        let env = Environment::new()?;
        let history_path = history::default_path(env.home());
        Self::with_history_file(env, history_path)
    }

    /// Set up an interpreter with an explicit history file (or none).
    ///
    /// The search path is read from the environment once, here.
    pub fn with_history_file(env: Environment, history_path: Option<PathBuf>) -> Result<Self> {
        let (history, next_seq) = match &history_path {
            Some(path) => HistoryStore::load(path, HISTORY_CAPACITY)
                .with_context(|| format!("cannot read history from {}", path.display()))?,
            None => (HistoryStore::new(HISTORY_CAPACITY), 0),
        };
        let search_path = env.search_path();
        Ok(Self {
            env,
            search_path,
            history,
            history_path,
            next_seq,
        })
    }

    /// Prompt, read and execute lines until end-of-input or `exit`,
    /// then save the history file.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    if self.execute_line(&line, &mut io::stdout())? == LineStatus::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
                Err(err) => return Err(err.into()),
            }
        }
        if let Some(path) = &self.history_path {
            self.history
                .save(path)
                .with_context(|| format!("cannot save history to {}", path.display()))?;
        }
        println!();
        Ok(())
    }

    /// Execute one raw command line, writing reports and line-level
    /// diagnostics to `out`.
    ///
    /// A line either fully executes (a built-in or exactly one child
    /// process) and is recorded in history, or it is abandoned with a
    /// diagnostic. Only resource-level failures return an error.
    fn execute_line(&mut self, raw: &str, out: &mut dyn Write) -> Result<LineStatus> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(LineStatus::Continue);
        }

        // `!` recall rewrites the line before anything else sees it; the
        // substituted text is echoed and then treated as freshly typed.
        let line = if raw.starts_with('!') {
            match history::substitute(raw, &self.history, self.next_seq) {
                Ok(text) => {
                    writeln!(out, "{text}")?;
                    text
                }
                Err(e) => {
                    writeln!(out, "{e}")?;
                    return Ok(LineStatus::Continue);
                }
            }
        } else {
            raw.to_owned()
        };

        let tokens = lexer::tokenize(&line, lexer::WORD_SEPARATORS);
        if tokens.is_empty() {
            return Ok(LineStatus::Continue);
        }

        let mut tokens = match expand::expand_filenames(tokens) {
            Ok(tokens) => tokens,
            Err(e) => {
                writeln!(out, "{e}")?;
                return Ok(LineStatus::Continue);
            }
        };

        match builtin::dispatch(&tokens, &mut self.env, &self.history, out)? {
            BuiltinOutcome::Terminate => return Ok(LineStatus::Exit),
            BuiltinOutcome::Failed => return Ok(LineStatus::Continue),
            BuiltinOutcome::Handled => {
                self.record(line);
                return Ok(LineStatus::Continue);
            }
            BuiltinOutcome::NotBuiltin => {}
        }

        let redirection = match redirect::resolve(&mut tokens, &self.env.current_dir) {
            Ok(r) => r,
            Err(e) => {
                writeln!(out, "{e}")?;
                return Ok(LineStatus::Continue);
            }
        };

        let Some(exe) = external::find_executable(&tokens[0], &self.search_path) else {
            writeln!(out, "{}: Command not found", tokens[0])?;
            return Ok(LineStatus::Continue);
        };

        writeln!(out, "Running {} ...\n--------------------", exe.display())?;
        out.flush()?;
        let code = external::launch(&exe, &tokens, redirection, &self.env)?;
        writeln!(out, "--------------------\nReturns {code}")?;

        self.record(line);
        Ok(LineStatus::Continue)
    }

    /// Record a completed line under the next sequence number.
    fn record(&mut self, line: String) {
        self.history.append(self.next_seq, line);
        self.next_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn interpreter() -> Interpreter {
        let env = Environment::new().unwrap();
        Interpreter::with_history_file(env, None).unwrap()
    }

    fn run(sh: &mut Interpreter, line: &str) -> (LineStatus, String) {
        let mut out = Vec::new();
        let status = sh.execute_line(line, &mut out).unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn empty_and_blank_lines_are_inert() {
        let mut sh = interpreter();
        assert_eq!(run(&mut sh, "").0, LineStatus::Continue);
        assert_eq!(run(&mut sh, "   \t ").0, LineStatus::Continue);
        assert!(sh.history.is_empty());
    }

    #[test]
    fn end_to_end_echo_with_output_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.txt");

        let mut sh = interpreter();
        let (status, output) = run(&mut sh, &format!("echo hi > {}", out_path.display()));

        assert_eq!(status, LineStatus::Continue);
        assert!(output.contains("Returns 0"), "got: {output}");
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "hi\n");
        assert_eq!(sh.history.len(), 1);
    }

    #[test]
    fn command_not_found_is_diagnosed_and_not_recorded() {
        let mut sh = interpreter();
        let (status, output) = run(&mut sh, "no_such_command_12345");
        assert_eq!(status, LineStatus::Continue);
        assert!(output.contains("no_such_command_12345: Command not found"));
        assert!(sh.history.is_empty());
    }

    #[test]
    fn invalid_redirection_aborts_the_line() {
        let mut sh = interpreter();
        let (_, output) = run(&mut sh, "echo hi > out.txt extra");
        assert!(output.contains("Invalid i/o redirection"));
        assert!(sh.history.is_empty());
    }

    #[test]
    fn substituted_line_is_echoed_and_rerecorded() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.txt");
        let command = format!("echo again > {}", out_path.display());

        let mut sh = interpreter();
        run(&mut sh, &command);
        let (_, output) = run(&mut sh, "!!");

        assert!(output.starts_with(&command), "got: {output}");
        assert!(output.contains("Returns 0"));
        assert_eq!(sh.history.len(), 2);
        assert_eq!(sh.history.lookup(1), Some(command.as_str()));
    }

    #[test]
    fn failed_substitution_is_diagnosed_and_not_recorded() {
        let mut sh = interpreter();
        let (_, output) = run(&mut sh, "!99");
        assert!(output.contains("No command #99"));

        let (_, output) = run(&mut sh, "! 1");
        assert!(output.contains("Invalid history substitution"));
        assert!(sh.history.is_empty());
    }

    #[test]
    fn builtin_lines_are_recorded_but_failed_cd_is_not() {
        let mut sh = interpreter();
        run(&mut sh, "pwd");
        assert_eq!(sh.history.lookup(0), Some("pwd"));

        run(&mut sh, "cd definitely/not/here");
        assert_eq!(sh.history.len(), 1);
    }

    #[test]
    fn exit_stops_the_loop() {
        let mut sh = interpreter();
        assert_eq!(run(&mut sh, "exit").0, LineStatus::Exit);
    }

    #[test]
    fn histories_are_independent_between_interpreters() {
        let mut a = interpreter();
        let mut b = interpreter();
        run(&mut a, "pwd");
        assert_eq!(a.history.len(), 1);
        assert!(b.history.is_empty());
        run(&mut b, "pwd");
        assert_eq!(b.history.len(), 1);
    }
}
