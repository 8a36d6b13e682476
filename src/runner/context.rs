//! Execution context for recipe running
//!
//! The context carries everything an invocation needs from the outside world:
//! paths, the captured ambient environment and output preferences. It is built
//! once per invocation and never mutated while recipes run.

use colored::Colorize;
use indexmap::IndexMap;
use std::env;
use std::path::{Path, PathBuf};

/// Ordered string-to-string environment mapping
pub type Environment = IndexMap<String, String>;

/// Caller-provided state for one invocation
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory command lines run in
    pub working_dir: PathBuf,

    /// Path of the recipe file
    pub justfile_path: PathBuf,

    /// Directory the tool was invoked from
    pub invocation_dir: PathBuf,

    /// Path of the running binary
    pub executable: PathBuf,

    /// Ambient environment captured at startup
    pub environment: Environment,

    /// Verbosity level
    pub verbosity: Verbosity,

    /// Print commands instead of running them
    pub dry_run: bool,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings and an empty environment
    pub fn new() -> Self {
        let working_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Context {
            justfile_path: working_dir.join("justfile"),
            invocation_dir: working_dir.clone(),
            working_dir,
            executable: PathBuf::from(env!("CARGO_PKG_NAME")),
            environment: Environment::new(),
            verbosity: Verbosity::Normal,
            dry_run: false,
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the recipe file path
    pub fn with_justfile_path(mut self, path: PathBuf) -> Self {
        self.justfile_path = path;
        self
    }

    pub fn with_invocation_dir(mut self, dir: PathBuf) -> Self {
        self.invocation_dir = dir;
        self
    }

    pub fn with_executable(mut self, path: PathBuf) -> Self {
        self.executable = path;
        self
    }

    /// Replace the ambient environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Capture the process environment as the ambient environment
    pub fn with_process_environment(self) -> Self {
        self.with_environment(env::vars().collect())
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory containing the recipe file
    pub fn justfile_dir(&self) -> &Path {
        match self.justfile_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => &self.working_dir,
        }
    }

    /// Echo a command line before it runs
    pub fn print_command(&self, command: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", command.bold());
        }
    }

    /// Print a command line that a dry run skips
    pub fn print_dry_run(&self, command: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{}", command);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = Context::new();
        assert_eq!(ctx.verbosity, Verbosity::Normal);
        assert!(ctx.environment.is_empty());
        assert!(!ctx.dry_run);
    }

    #[test]
    fn test_context_with_environment() {
        let mut environment = Environment::new();
        environment.insert("KEY".to_string(), "value".to_string());

        let ctx = Context::new().with_environment(environment);
        assert_eq!(ctx.environment.get("KEY"), Some(&"value".to_string()));
    }

    #[test]
    fn test_justfile_dir() {
        let ctx = Context::new().with_justfile_path(PathBuf::from("/work/app/justfile"));
        assert_eq!(ctx.justfile_dir(), Path::new("/work/app"));

        let ctx = Context::new()
            .with_working_dir(PathBuf::from("/fallback"))
            .with_justfile_path(PathBuf::from("justfile"));
        assert_eq!(ctx.justfile_dir(), Path::new("/fallback"));
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
        assert!(Verbosity::Quiet > Verbosity::Silent);
    }

    #[test]
    fn test_with_verbosity() {
        let ctx = Context::new().with_verbosity(Verbosity::Verbose);
        assert_eq!(ctx.verbosity, Verbosity::Verbose);
    }
}
