use crate::lexer;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Directories searched for executables when PATH is not set.
pub const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: a map of environment variables that will be visible to executed commands.
/// - `current_dir`: the working directory for command execution.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes
    /// `current_dir` from `std::env::current_dir()`. Failure to determine the
    /// working directory is fatal: the interpreter cannot run without one.
    pub fn new() -> Result<Self> {
        let mut vars = HashMap::new();
        for (k, v) in stdenv::vars() {
            vars.insert(k, v);
        }
        let current_dir =
            stdenv::current_dir().context("cannot determine the current working directory")?;
        Ok(Self { vars, current_dir })
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The list of directories searched for executables, in order.
    ///
    /// Split from the PATH variable on `:`, falling back to
    /// [`DEFAULT_SEARCH_PATH`] when PATH is absent. The interpreter reads
    /// this once at startup.
    pub fn search_path(&self) -> Vec<PathBuf> {
        let raw = self
            .get_var("PATH")
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_owned());
        lexer::tokenize(&raw, ":")
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }

    /// The user's home directory, from HOME or the platform fallback.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME").map(PathBuf::from).or_else(dirs::home_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env as stdenv;

    fn bare_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = bare_env();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new().unwrap();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_search_path_splits_path_var() {
        let mut env = bare_env();
        env.set_var("PATH", "/opt/bin:/usr/games");
        assert_eq!(
            env.search_path(),
            vec![PathBuf::from("/opt/bin"), PathBuf::from("/usr/games")]
        );
    }

    #[test]
    fn test_default_search_path_is_two_directories() {
        let mut env = bare_env();
        // get_var falls back to the process PATH, so pin the default here.
        env.set_var("PATH", DEFAULT_SEARCH_PATH);
        assert_eq!(
            env.search_path(),
            vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")]
        );
    }
}
