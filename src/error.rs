//! Error types for rjust

use std::io;
use thiserror::Error;

/// Exit code used for every failure that is not a failing command
pub const EXIT_FAILURE: i32 = 1;

/// Result type alias for rjust operations
pub type Result<T> = std::result::Result<T, RjustError>;

/// Main error type for rjust
#[derive(Error, Debug)]
pub enum RjustError {
    /// Recipe file discovery and loading errors
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Malformed recipe file
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// Bad variable graph or function call
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Unknown recipe, bad dependency graph or bad arguments
    #[error("{0}")]
    Recipe(#[from] RecipeError),

    /// A command line failed
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RjustError {
    /// Exit code the process should terminate with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RjustError::Execution(ExecutionError::CommandFailed { code, .. }) => *code,
            RjustError::Execution(ExecutionError::Interrupted { signal }) => 128 + signal,
            _ => EXIT_FAILURE,
        }
    }
}

/// Recipe file discovery errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No justfile found (searched: {0})")]
    NotFound(String),

    #[error("Failed to read '{path}': {error}")]
    Read { path: String, error: String },

    #[error("Failed to load dotenv file '{path}': {error}")]
    Dotenv { path: String, error: String },
}

/// Malformed recipe file. Every variant carries the 1-based line number.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("line {line}: unrecognized line: {text}")]
    UnrecognizedLine { line: usize, text: String },

    #[error("line {line}: indented line outside of a recipe: {text}")]
    UnexpectedIndent { line: usize, text: String },

    #[error("line {line}: unknown setting '{name}'")]
    UnknownSetting { line: usize, name: String },

    #[error("line {line}: invalid value for setting '{name}': {message}")]
    InvalidSettingValue {
        line: usize,
        name: String,
        message: String,
    },

    #[error("line {line}: setting '{name}' is set more than once")]
    DuplicateSetting { line: usize, name: String },

    #[error("line {line}: variable '{name}' is defined more than once")]
    DuplicateVariable { line: usize, name: String },

    #[error("line {line}: recipe '{name}' is defined more than once")]
    DuplicateRecipe { line: usize, name: String },

    #[error("line {line}: unknown attribute '{name}'")]
    UnknownAttribute { line: usize, name: String },

    #[error("line {line}: {message}")]
    Expression { line: usize, message: String },

    #[error("line {line}: unterminated interpolation: {text}")]
    UnterminatedInterpolation { line: usize, text: String },
}

/// Variable and function resolution errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Variable '{0}' is not defined")]
    UnresolvedReference(String),

    #[error("Variable cycle detected: {0}")]
    CyclicReference(String),

    #[error("Function '{0}' does not exist")]
    UnknownFunction(String),

    #[error("Function '{name}' takes {expected} argument(s) but {found} were given")]
    FunctionArity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Environment variable '{0}' is not present")]
    EnvironmentVariable(String),

    #[error("Positional argument {index} is out of range ({count} given)")]
    PositionalOutOfRange { index: usize, count: usize },

    #[error("Positional argument {0} referenced outside of a recipe")]
    PositionalOutsideRecipe(usize),
}

/// Recipe lookup, dependency graph and argument binding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Justfile does not contain recipe '{0}'")]
    NotFound(String),

    #[error("Recipe '{0}' has no body")]
    Empty(String),

    #[error("Recipe '{recipe}' depends on unknown recipe '{dependency}'")]
    UnknownDependency { recipe: String, dependency: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Recipe '{recipe}' takes {expected} argument(s) but {found} were given")]
    ArgumentCount {
        recipe: String,
        expected: String,
        found: usize,
    },

    #[error("Recipe '{recipe}' depends on '{dependency}', which requires arguments")]
    DependencyArguments { recipe: String, dependency: String },

    #[error("Recipe '{recipe}' has duplicate parameter '{parameter}'")]
    DuplicateParameter { recipe: String, parameter: String },

    #[error("Recipe '{recipe}': parameter '{parameter}' {message}")]
    ParameterOrder {
        recipe: String,
        parameter: String,
        message: String,
    },
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Recipe '{recipe}' failed on line '{command}' with exit code {code}")]
    CommandFailed {
        recipe: String,
        command: String,
        code: i32,
    },

    #[error("Failed to spawn '{program}': {error}")]
    Spawn { program: String, error: io::Error },

    #[error("Failed to wait for '{program}': {error}")]
    Wait { program: String, error: io::Error },

    #[error("Interrupted by signal {signal}")]
    Interrupted { signal: i32 },

    #[error("Failed to install handler for {signal}: {error}")]
    SignalHandler { signal: String, error: String },
}

/// Specialized result type for recipe file discovery
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for parsing
pub type SyntaxResult<T> = std::result::Result<T, SyntaxError>;

/// Specialized result type for resolution
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Specialized result type for recipe validation and binding
pub type RecipeResult<T> = std::result::Result<T, RecipeError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_forwards_command_failure() {
        let err = RjustError::from(ExecutionError::CommandFailed {
            recipe: "lint".to_string(),
            command: "false".to_string(),
            code: 3,
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_reserved_for_configuration_errors() {
        let err = RjustError::from(RecipeError::NotFound("nope".to_string()));
        assert_eq!(err.exit_code(), EXIT_FAILURE);

        let err = RjustError::from(ResolveError::CyclicReference("a -> a".to_string()));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_for_interrupt() {
        let err = RjustError::from(ExecutionError::Interrupted { signal: 2 });
        assert_eq!(err.exit_code(), 130);
    }

    #[test]
    fn test_syntax_error_mentions_line() {
        let err = SyntaxError::UnrecognizedLine {
            line: 4,
            text: "what".to_string(),
        };
        assert!(err.to_string().contains("line 4"));
    }
}
