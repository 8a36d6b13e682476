//! Common test utilities

#![allow(dead_code)]

use rjust::error::ExecutionResult;
use rjust::runner::{CommandSpec, ProcessRunner};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory with a justfile
pub fn create_test_justfile(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let justfile_path = temp_dir.path().join("justfile");
    fs::write(&justfile_path, content).unwrap();
    (temp_dir, justfile_path)
}

/// Create a justfile with an empty subdirectory next to it
pub fn create_test_justfile_in_subdir(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let (temp_dir, justfile_path) = create_test_justfile(content);
    let sub_dir = temp_dir.path().join("subdir");
    fs::create_dir(&sub_dir).unwrap();
    (temp_dir, justfile_path, sub_dir)
}

/// Records every command instead of spawning it
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub commands: Vec<CommandSpec>,
    /// Exit code reported for the command at the same position
    pub codes: Vec<i32>,
}

impl RecordingRunner {
    pub fn failing_at(index: usize, code: i32) -> Self {
        let mut codes = vec![0; index];
        codes.push(code);
        RecordingRunner {
            commands: Vec::new(),
            codes,
        }
    }

    /// The shell command text of each recorded command
    pub fn texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|spec| spec.args.last().cloned())
            .collect()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&mut self, spec: &CommandSpec) -> ExecutionResult<i32> {
        let code = self.codes.get(self.commands.len()).copied().unwrap_or(0);
        self.commands.push(spec.clone());
        Ok(code)
    }
}
