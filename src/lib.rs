//! A tiny interactive shell.
//!
//! This crate implements a line-oriented command interpreter: each line is
//! tokenized, wildcard-expanded, checked against a small set of built-ins,
//! then resolved on the search path and run as a single child process, with
//! optional `<`/`>` redirection of the child's standard streams. Executed
//! lines land in a bounded command history that persists across sessions in
//! `~/.minish_history` and can be recalled with `!!` or `!N`.
//!
//! The main entry point is [`Interpreter`], which owns the environment and
//! history and drives the read-eval loop. The individual stages live in the
//! public modules so they can be exercised on their own.

pub mod builtin;
pub mod env;
pub mod expand;
pub mod external;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod redirect;

/// Just a convenient re-export of the interactive command runner.
pub use interpreter::Interpreter;
