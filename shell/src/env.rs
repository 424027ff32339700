use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// The interpreter's view of the process environment.
///
/// Variables are snapshotted at startup and passed to every external command;
/// `current_dir` is kept in sync with the process working directory by `cd`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variables visible to executed commands (e.g. PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process variables and working directory.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Look the key up in `self.vars` first, falling back to the process environment.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The home directory, as given by `HOME`.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    /// Interpret `path` relative to `current_dir` unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn empty_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/srv/work"),
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = empty_env();

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_home_dir_prefers_own_vars() {
        let mut env = empty_env();
        env.set_var("HOME", "/home/someone");
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/someone")));

        env.set_var("HOME", "");
        assert_eq!(env.home_dir(), None);
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let env = empty_env();
        assert_eq!(env.resolve("src"), PathBuf::from("/srv/work/src"));
        assert_eq!(env.resolve("/etc"), PathBuf::from("/etc"));
    }
}
