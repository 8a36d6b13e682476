//! End-to-end tests for the rjust binary

mod common;

use assert_cmd::Command;
use common::{create_test_justfile, create_test_justfile_in_subdir};
use predicates::prelude::*;

const JUSTFILE: &str = r#"
greeting := "hello"

# Print a greeting
greet name="world":
    echo {{greeting}} {{name}}

fail:
    echo before
    exit 3
    echo after

_internal:
    echo hidden

@quiet-one:
    echo shh
"#;

fn rjust() -> Command {
    Command::cargo_bin("rjust").unwrap()
}

#[test]
fn test_no_recipe_lists_public_recipes() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Available recipes:"))
        .stdout(predicate::str::contains(
            "greet name='world' # Print a greeting",
        ))
        .stdout(predicate::str::contains("fail"))
        .stdout(predicate::str::contains("quiet-one"))
        .stdout(predicate::str::contains("_internal").not());
}

#[test]
fn test_run_recipe_with_argument() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .args(["greet", "rust"])
        .assert()
        .success()
        .stdout("hello rust\n")
        .stderr(predicate::str::contains("echo hello rust"));
}

#[test]
fn test_quiet_recipe_does_not_echo() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .arg("quiet-one")
        .assert()
        .success()
        .stdout("shh\n")
        .stderr(predicate::str::contains("echo shh").not());
}

#[test]
fn test_failing_command_forwards_exit_code() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .arg("fail")
        .assert()
        .code(3)
        .stdout("before\n")
        .stderr(predicate::str::contains("exit code 3"));
}

#[test]
fn test_unknown_recipe_exits_with_failure() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .arg("deploy")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("does not contain recipe 'deploy'"));
}

#[test]
fn test_syntax_error_exits_with_failure() {
    let (temp_dir, _) = create_test_justfile("build\n    echo hi\n");

    rjust()
        .current_dir(temp_dir.path())
        .arg("build")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_dry_run_prints_without_running() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .args(["--dry-run", "greet"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("echo hello world"));
}

#[test]
fn test_runs_from_subdirectory_in_justfile_directory() {
    let (temp_dir, _, sub_dir) =
        create_test_justfile_in_subdir("where:\n    @ls\n");

    rjust()
        .current_dir(&sub_dir)
        .arg("where")
        .assert()
        .success()
        .stdout(predicate::str::contains("justfile"));

    drop(temp_dir);
}

#[test]
fn test_explicit_justfile_path() {
    let (temp_dir, justfile_path) = create_test_justfile(JUSTFILE);
    let elsewhere = tempfile::TempDir::new().unwrap();

    rjust()
        .current_dir(elsewhere.path())
        .arg("--justfile")
        .arg(&justfile_path)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("greet"));

    drop(temp_dir);
}

#[test]
fn test_evaluate_prints_variables() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .arg("--evaluate")
        .assert()
        .success()
        .stdout("greeting := \"hello\"\n");
}

#[test]
fn test_show_prints_recipe() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .args(["--show", "fail"])
        .assert()
        .success()
        .stdout("fail:\n    echo before\n    exit 3\n    echo after\n");
}

#[test]
fn test_dump_is_yaml() {
    let (temp_dir, _) = create_test_justfile(JUSTFILE);

    rjust()
        .current_dir(temp_dir.path())
        .arg("--dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("recipes:"))
        .stdout(predicate::str::contains("positional-arguments: false"));
}

#[test]
fn test_exported_variable_visible_to_shell() {
    let (temp_dir, _) =
        create_test_justfile("export GREETING := \"hi there\"\n\nshow:\n    @echo \"$GREETING\"\n");

    rjust()
        .current_dir(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout("hi there\n");
}

#[test]
fn test_missing_justfile() {
    let temp_dir = tempfile::TempDir::new().unwrap();

    rjust()
        .current_dir(temp_dir.path())
        .arg("--justfile")
        .arg(temp_dir.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_relative_justfile_path_resolved_against_invocation_directory() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let ci_dir = temp_dir.path().join("ci");
    std::fs::create_dir(&ci_dir).unwrap();
    std::fs::write(
        ci_dir.join("justfile"),
        concat!(
            "where:\n",
            "    @test -f {{quote(justfile())}} && echo found\n",
            "    @basename {{quote(justfile_directory())}}\n",
        ),
    )
    .unwrap();

    rjust()
        .current_dir(temp_dir.path())
        .args(["-f", "ci/justfile", "where"])
        .assert()
        .success()
        .stdout("found\nci\n");
}

#[test]
fn test_relative_working_directory() {
    let (temp_dir, _, _) = create_test_justfile_in_subdir("here:\n    @basename \"$(pwd -P)\"\n");

    rjust()
        .current_dir(temp_dir.path())
        .args(["-d", "subdir", "here"])
        .assert()
        .success()
        .stdout("subdir\n");
}

#[cfg(unix)]
#[test]
fn test_interrupt_is_forwarded_and_stops_recipe() {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::process::{Command as StdCommand, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    let (temp_dir, _) = create_test_justfile(concat!(
        "wait:\n",
        "    @trap 'touch trapped; exit 130' INT; touch ready; ",
        "i=0; while [ $i -lt 100 ]; do sleep 0.1; i=$((i+1)); done\n",
        "    @touch after\n",
    ));

    let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin("rjust"))
        .current_dir(temp_dir.path())
        .arg("wait")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let ready = temp_dir.path().join("ready");
    let started = Instant::now();
    while !ready.exists() {
        assert!(
            started.elapsed() < Duration::from_secs(10),
            "recipe never started"
        );
        thread::sleep(Duration::from_millis(20));
    }

    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(130));
    assert!(temp_dir.path().join("trapped").exists());
    assert!(!temp_dir.path().join("after").exists());
}
