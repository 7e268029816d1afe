//! Splitting raw text into words on a set of separator characters.
//!
//! This is deliberately much simpler than a full shell lexer: the command
//! language here has no quoting or substitutions, so a word is just a maximal
//! run of non-separator characters. The same routine splits command lines on
//! whitespace and the PATH variable on `:`.

/// Separator set used for command lines.
pub const WORD_SEPARATORS: &str = " \t";

/// Split `line` into owned words on any run of characters from `separators`.
///
/// Consecutive separators collapse, so no empty words are ever produced.
/// An empty or all-separator input yields an empty vector; callers must check
/// for that before indexing the result.
pub fn tokenize(line: &str, separators: &str) -> Vec<String> {
    line.split(|c| separators.contains(c))
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_runs_of_separators() {
        assert_eq!(tokenize("  ls   -l  ", WORD_SEPARATORS), vec!["ls", "-l"]);
    }

    #[test]
    fn tabs_and_spaces_both_separate() {
        assert_eq!(
            tokenize("echo\thello \t world", WORD_SEPARATORS),
            vec!["echo", "hello", "world"]
        );
    }

    #[test]
    fn all_separator_input_yields_nothing() {
        assert!(tokenize("   \t ", WORD_SEPARATORS).is_empty());
        assert!(tokenize("", WORD_SEPARATORS).is_empty());
    }

    #[test]
    fn splits_search_path_on_colon() {
        assert_eq!(
            tokenize("/bin:/usr/bin::/usr/local/bin", ":"),
            vec!["/bin", "/usr/bin", "/usr/local/bin"]
        );
    }
}
