//! Integration tests for the tabledoc binary

use std::process::Command;

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tabledoc"))
        // Tests must be deterministic and not depend on a user's ~/.config/tabledoc/config.toml.
        .args(["--rows", "7", "--cols", "8"])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_auto_prepend_equals() {
    let (stdout1, _, _) = run_command(&["-c", "10 + 5"]);
    let (stdout2, _, _) = run_command(&["-c", "=10 + 5"]);
    assert_eq!(stdout1, stdout2);
}

#[test]
fn test_formula_over_cells() {
    let (stdout, _, code) = run_command(&["-s", "A1=5", "-s", "B1==A1*2", "-e", "B1"]);
    assert_eq!(stdout.trim(), "10");
    assert_eq!(code, 0);
}

#[test]
fn test_requests_run_in_order() {
    let (stdout, _, code) = run_command(&[
        "-s", "A1=1", "-e", "A1", "-s", "A1=2", "-e", "A1", "-c", "SUM(A1:A3)",
    ]);
    assert_eq!(stdout.trim(), "1\n2\n2");
    assert_eq!(code, 0);
}

#[test]
fn test_range_is_reported() {
    let (stdout, _, code) = run_command(&["-r", "block=C3:D4", "-g", "block"]);
    assert_eq!(stdout.trim(), "C3:D4");
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_range_fails() {
    let (_, stderr, code) = run_command(&["-g", "totals"]);
    assert!(stderr.contains("totals"));
    assert_eq!(code, 1);
}

#[test]
fn test_error_exit_code() {
    let (stdout, _, code) = run_command(&["-c", "undefined_function()"]);
    assert_eq!(stdout.trim(), "#NAME?");
    assert_eq!(code, 1);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-c", "1/0"]);
    assert!(stdout.starts_with("#ERR"));
    assert_eq!(code, 1);
}

#[test]
fn test_cycle_reported() {
    let (stdout, _, code) = run_command(&["-s", "A1==B1", "-s", "B1==A1", "-e", "A1"]);
    assert_eq!(stdout.trim(), "#CYCLE!");
    assert_eq!(code, 1);
}

#[test]
fn test_write_outside_grid_fails() {
    let (_, stderr, code) = run_command(&["--rows", "2", "-s", "A3=1"]);
    assert!(stderr.contains("A3"));
    assert_eq!(code, 1);
}

#[test]
fn test_text_cells() {
    let (stdout, _, code) = run_command(&["-s", "A1=hello", "-e", "A1", "-e", "B1"]);
    assert_eq!(stdout, "hello\n\n");
    assert_eq!(code, 0);
}
