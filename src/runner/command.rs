//! Command execution
//!
//! Every command line becomes a [`CommandSpec`]: a plain record of program,
//! arguments, extra environment and working directory. A [`ProcessRunner`]
//! turns that record into a process and reports its exit code.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{signals, Environment};
use std::path::PathBuf;
use std::process::{Command as StdCommand, ExitStatus, Stdio};

/// A fully resolved subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,

    /// Arguments after the program
    pub args: Vec<String>,

    /// Variables added to the inherited environment
    pub env: Environment,

    /// Directory the process runs in
    pub working_dir: PathBuf,
}

impl CommandSpec {
    /// Build an invocation from a shell setting such as `["bash", "-c"]`.
    ///
    /// The command text is appended after the shell's flags. When positional
    /// arguments are given, the recipe name follows as `$0` and the arguments
    /// as `$1..`.
    pub fn from_shell(
        shell: &[String],
        command: &str,
        positional: Option<(&str, &[String])>,
        env: Environment,
        working_dir: PathBuf,
    ) -> Self {
        let (program, flags) = match shell.split_first() {
            Some((program, flags)) => (program.clone(), flags.to_vec()),
            None => ("sh".to_string(), vec!["-cu".to_string()]),
        };

        let mut args = flags;
        args.push(command.to_string());
        if let Some((recipe, arguments)) = positional {
            args.push(recipe.to_string());
            args.extend(arguments.iter().cloned());
        }

        CommandSpec {
            program,
            args,
            env,
            working_dir,
        }
    }
}

/// Runs a command to completion and reports its exit code
pub trait ProcessRunner {
    fn run(&mut self, spec: &CommandSpec) -> ExecutionResult<i32>;
}

/// Runs commands as real child processes with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> ExecutionResult<i32> {
        let mut command = StdCommand::new(&spec.program);
        command.args(&spec.args);
        command.current_dir(&spec.working_dir);
        command.envs(&spec.env);

        command.stdin(Stdio::inherit());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|error| ExecutionError::Spawn {
            program: spec.program.clone(),
            error,
        })?;

        let guard = signals::ChildGuard::new(child.id());
        let status = child.wait().map_err(|error| ExecutionError::Wait {
            program: spec.program.clone(),
            error,
        });
        drop(guard);

        if let Some(signal) = signals::received() {
            return Err(ExecutionError::Interrupted { signal });
        }
        Ok(exit_code(status?))
    }
}

/// Exit code of a finished process; a signal `n` maps to `128 + n`
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    crate::error::EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn spec(command: &str) -> CommandSpec {
        CommandSpec::from_shell(
            &shell(&["sh", "-c"]),
            command,
            None,
            Environment::new(),
            std::env::temp_dir(),
        )
    }

    #[test]
    fn test_from_shell_appends_command() {
        let spec = CommandSpec::from_shell(
            &shell(&["/usr/bin/env", "bash", "-euo", "pipefail", "-c"]),
            "cargo fmt --all",
            None,
            Environment::new(),
            PathBuf::from("/work"),
        );
        assert_eq!(spec.program, "/usr/bin/env");
        assert_eq!(
            spec.args,
            vec!["bash", "-euo", "pipefail", "-c", "cargo fmt --all"]
        );
    }

    #[test]
    fn test_from_shell_with_positional_arguments() {
        let arguments = vec!["a b".to_string(), "c".to_string()];
        let spec = CommandSpec::from_shell(
            &shell(&["sh", "-cu"]),
            "echo \"$1\"",
            Some(("greet", &arguments)),
            Environment::new(),
            PathBuf::from("/work"),
        );
        assert_eq!(spec.args, vec!["-cu", "echo \"$1\"", "greet", "a b", "c"]);
    }

    #[test]
    fn test_system_runner_success() {
        assert_eq!(SystemRunner.run(&spec("true")).unwrap(), 0);
    }

    #[test]
    fn test_system_runner_forwards_exit_code() {
        assert_eq!(SystemRunner.run(&spec("exit 7")).unwrap(), 7);
    }

    #[test]
    fn test_system_runner_passes_environment() {
        let mut env = Environment::new();
        env.insert("RJUST_TEST_VALUE".to_string(), "expected".to_string());
        let mut spec = spec("test \"$RJUST_TEST_VALUE\" = expected");
        spec.env = env;
        assert_eq!(SystemRunner.run(&spec).unwrap(), 0);
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let spec = CommandSpec::from_shell(
            &shell(&["/definitely/not/a/shell"]),
            "true",
            None,
            Environment::new(),
            std::env::temp_dir(),
        );
        let result = SystemRunner.run(&spec);
        assert!(matches!(result, Err(ExecutionError::Spawn { .. })));
    }
}
