//! Wildcard expansion of command-line arguments.
//!
//! Arguments after the command name may contain `*`, `?` or `[...]` patterns
//! or a leading `~`. Patterns are matched against the filesystem via the
//! [`glob`] crate; a pattern with no matches stays in the argument list
//! literally, the way `glob(3)` behaves with `GLOB_NOCHECK`.

use thiserror::Error;

/// A syntactically malformed pattern. Aborts the whole line, not just the token.
#[derive(Debug, Error)]
#[error("{0}: bad wildcard pattern")]
pub struct ExpandError(String);

/// Expand wildcard patterns in every token after the first.
///
/// The command name passes through untouched. Matches replace their pattern
/// in sorted enumeration order, and the relative order of tokens is
/// preserved. Tokens without metacharacters, and patterns that match
/// nothing, come through unchanged.
pub fn expand_filenames(tokens: Vec<String>) -> Result<Vec<String>, ExpandError> {
    let mut words = tokens.into_iter();
    let Some(command) = words.next() else {
        return Ok(Vec::new());
    };

    let mut expanded = vec![command];
    for word in words {
        let word = expand_tilde(word);
        if !has_metacharacters(&word) {
            expanded.push(word);
            continue;
        }

        let paths = glob::glob(&word).map_err(|_| ExpandError(word.clone()))?;
        let before = expanded.len();
        // Entries that fail to read (e.g. an unreadable directory along the
        // way) are skipped rather than failing the match, as glob(3) does.
        expanded.extend(
            paths
                .filter_map(Result::ok)
                .map(|path| path.to_string_lossy().into_owned()),
        );
        if expanded.len() == before {
            expanded.push(word);
        }
    }
    Ok(expanded)
}

fn has_metacharacters(word: &str) -> bool {
    word.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
}

/// Replace a leading `~` or `~/` with the home directory, when known.
fn expand_tilde(word: String) -> String {
    let Some(rest) = word.strip_prefix('~') else {
        return word;
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return word; // ~user form is not supported, leave it alone
    }
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => word,
    }
}
