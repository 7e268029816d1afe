//! Bounded, persistent command history with `!`-substitution.
//!
//! The store keeps the most recent [`HISTORY_CAPACITY`] command lines, each
//! tagged with the sequence number it was assigned when recorded. Numbers are
//! assigned by the caller and are monotonic forever: eviction never renumbers
//! the surviving entries, and neither does a reload from disk. On disk each
//! entry occupies one ` %3d  %s` line of `~/.minish_history`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum number of entries retained in memory and on disk.
pub const HISTORY_CAPACITY: usize = 20;

/// Name of the history file inside the user's home directory.
const HISTORY_FILE: &str = ".minish_history";

/// A single recorded command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Sequence number assigned when the line was recorded.
    pub seq: i32,
    /// The command line verbatim, after any history substitution.
    pub text: String,
}

/// Ring buffer of the most recent command lines, oldest first.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryStore {
    /// Create an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Read a store back from `path`.
    ///
    /// Returns the store plus the next sequence number to assign: one past
    /// the highest number on file, or 0 when the file is absent or empty.
    /// A file that grew beyond `capacity` keeps only its newest entries.
    pub fn load(path: &Path, capacity: usize) -> io::Result<(Self, i32)> {
        let mut store = Self::new(capacity);
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((store, 0)),
            Err(e) => return Err(e),
        };

        let mut next_seq = 0;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let Some((seq, text)) = parse_entry(&line) else {
                continue; // tolerate a hand-edited or truncated line
            };
            if store.entries.len() == store.capacity {
                store.entries.pop_front();
            }
            store.entries.push_back(HistoryEntry {
                seq,
                text: text.to_owned(),
            });
            next_seq = next_seq.max(seq + 1);
        }
        Ok((store, next_seq))
    }

    /// Record a command line under `seq`, evicting the oldest entry when full.
    ///
    /// Surviving entries keep the numbers they were assigned.
    pub fn append(&mut self, seq: i32, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            seq,
            text: text.into(),
        });
    }

    /// The text recorded under sequence number `seq`, if still retained.
    pub fn lookup(&self, seq: i32) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.seq == seq)
            .map(|entry| entry.text.as_str())
    }

    /// Write all entries to `out` in stored order, one ` %3d  %s` line each.
    pub fn show(&self, out: &mut dyn Write) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(out, " {:>3}  {}", entry.seq, entry.text)?;
        }
        Ok(())
    }

    /// Overwrite `path` with the current enumeration.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.show(&mut out)?;
        out.flush()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in stored order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

/// Parse one ` %3d  %s` history line into its number and text.
fn parse_entry(line: &str) -> Option<(i32, &str)> {
    let rest = line.trim_start();
    let (seq, text) = rest.split_once("  ")?;
    Some((seq.parse().ok()?, text))
}

/// Default location of the history file: `$HOME/.minish_history`.
pub fn default_path(home: Option<PathBuf>) -> Option<PathBuf> {
    home.map(|dir| dir.join(HISTORY_FILE))
}

/// Why a `!` line could not be rewritten.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubstError {
    /// The character after `!` was neither a digit nor another `!`.
    #[error("Invalid history substitution")]
    Invalid,
    /// The referenced sequence number is not in the store.
    #[error("No command #{0}")]
    NotFound(i32),
}

/// Rewrite a line beginning with `!` into the historic line it refers to.
///
/// `!!` refers to `next_seq - 1`, the last completed command; `!<N>` refers
/// to sequence number N exactly (trailing characters after the digits are
/// ignored). The returned text is processed like a freshly typed line, so it
/// will be re-recorded under a new number.
pub fn substitute(line: &str, history: &HistoryStore, next_seq: i32) -> Result<String, SubstError> {
    let rest = line.strip_prefix('!').ok_or(SubstError::Invalid)?;
    let seq = match rest.chars().next() {
        Some('!') => next_seq - 1,
        Some(c) if c.is_ascii_digit() => {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().map_err(|_| SubstError::Invalid)?
        }
        _ => return Err(SubstError::Invalid),
    };
    history
        .lookup(seq)
        .map(str::to_owned)
        .ok_or(SubstError::NotFound(seq))
}
