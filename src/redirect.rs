//! Scanning a token sequence for `<`/`>` redirection operators.
//!
//! At most one redirection may appear on a line, and it must sit exactly
//! before the final token (the target path). A successful resolve opens the
//! target, removes the operator and target from the sequence, and hands the
//! open stream to the process launcher.

use nix::unistd::{AccessFlags, access};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How the child's standard streams should be wired.
#[derive(Debug)]
pub enum Redirection {
    /// No operator on the line: the child inherits the parent's streams.
    Inherit,
    /// `< file`: the file's contents become the child's standard input.
    Input(File),
    /// `> file`: the child's standard output and error both go to the file.
    Output(File),
}

// `File` has no equality, so compare variants only; tests need this for
// `assert_eq!` on `Result<Redirection, RedirectError>`.
#[cfg(test)]
impl PartialEq for Redirection {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Line-aborting redirection diagnostics, worded as the shell prints them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedirectError {
    #[error("Invalid i/o redirection")]
    InvalidPlacement,
    #[error("Input redirection: No such file or directory")]
    InputMissing,
    #[error("Input redirection: Permission denied")]
    InputDenied,
    #[error("Output redirection: Is a directory")]
    OutputIsDirectory,
    #[error("Output redirection: Permission denied")]
    OutputDenied,
    #[error("Output redirection: No such file or directory")]
    OutputMissing,
}

/// Resolve the redirection on a tokenized command line, if any.
///
/// Placement rules: the operator may not be the first token, must be
/// followed by exactly one token, and nothing may follow the target. On
/// success the operator and target are removed from `tokens`. Relative
/// targets resolve against `cwd`, the interpreter's working directory.
///
/// One deliberate asymmetry: an input target that turns out to be a
/// directory drops the redirection entirely and the command runs with
/// inherited streams, while a directory output target is always an error.
pub fn resolve(tokens: &mut Vec<String>, cwd: &Path) -> Result<Redirection, RedirectError> {
    let Some(first) = tokens.first() else {
        return Ok(Redirection::Inherit);
    };
    if is_operator(first) {
        return Err(RedirectError::InvalidPlacement);
    }

    let Some(at) = tokens.iter().position(|t| is_operator(t)) else {
        return Ok(Redirection::Inherit);
    };
    // Exactly one token (the target) may follow the operator.
    if at + 2 != tokens.len() {
        return Err(RedirectError::InvalidPlacement);
    }

    let target = locate(cwd, &tokens[at + 1]);
    let redirection = match tokens[at].as_str() {
        "<" => open_input(&target)?,
        _ => open_output(&target, cwd)?,
    };
    tokens.truncate(at);
    Ok(redirection)
}

fn is_operator(token: &str) -> bool {
    token == "<" || token == ">"
}

fn locate(cwd: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        target.to_owned()
    } else {
        cwd.join(target)
    }
}

fn open_input(target: &Path) -> Result<Redirection, RedirectError> {
    if !target.exists() {
        return Err(RedirectError::InputMissing);
    }
    if target.is_dir() {
        // Permissive fallback: run the command with no redirection at all.
        return Ok(Redirection::Inherit);
    }
    match File::open(target) {
        Ok(file) => Ok(Redirection::Input(file)),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(RedirectError::InputDenied),
        Err(_) => Err(RedirectError::InputMissing),
    }
}

fn open_output(target: &Path, cwd: &Path) -> Result<Redirection, RedirectError> {
    if access(cwd, AccessFlags::W_OK).is_err() {
        return Err(RedirectError::OutputDenied);
    }
    if target.is_dir() {
        return Err(RedirectError::OutputIsDirectory);
    }
    match File::create(target) {
        Ok(file) => Ok(Redirection::Output(file)),
        // Re-check existence to tell "cannot write" apart from "does not exist".
        Err(_) if !target.exists() => Err(RedirectError::OutputMissing),
        Err(_) => Err(RedirectError::OutputDenied),
    }
}
