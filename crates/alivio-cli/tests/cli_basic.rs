//! Basic CLI E2E tests.
//!
//! Each test runs the compiled binary against its own isolated home
//! directory so sessions never bleed into each other (or the developer's
//! real data).

use std::process::Command;

use tempfile::TempDir;

fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_alivio"))
        .args(args)
        .env("HOME", home.path())
        .env("ALIVIO_ENV", "dev")
        .output()
        .expect("failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn catalog_list_shows_checkpoint() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["catalog", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("previous_treatment"));
    assert!(stdout.contains("(checkpoint)"));
    assert!(stdout.contains("email"));
}

#[test]
fn catalog_show_prints_step_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["catalog", "show", "age"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"45-54\""));
}

#[test]
fn catalog_show_unknown_step_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["catalog", "show", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown step"));
}

#[test]
fn config_roundtrip() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "flow.resume_index"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (_, _, code) = run_cli(&home, &["config", "set", "flow.resume_index", "6"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "flow.resume_index"]);
    assert_eq!(stdout.trim(), "6");
}

#[test]
fn quiz_status_reports_first_step() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["quiz", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("asking"));
    assert!(stdout.contains("What is your age range?"));
}

#[test]
fn quiz_answer_scores_and_advances() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);

    let (stdout, _, code) = run_cli(&home, &["quiz", "answer", "age", "45-54"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("+15 points"));
    assert!(stdout.contains("unlocked"));
    assert!(stdout.contains("How intense is your pain?"));

    // Invalid option is inline feedback, not a failure.
    let (stdout, _, code) = run_cli(&home, &["quiz", "answer", "pain_level", "eleven"]);
    assert_ne!(code, 0);
    let _ = stdout;

    let (stdout, _, code) = run_cli(&home, &["quiz", "answer", "pain_level", "8"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("+20 points"));
}

#[test]
fn out_of_order_answer_is_rejected_inline() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);
    let (stdout, _, code) = run_cli(&home, &["quiz", "answer", "investment", "yes"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("not accepted"));
}

#[test]
fn unconfigured_collector_queues_events() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);

    let (stdout, _, code) = run_cli(&home, &["events", "pending"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("quiz-start"));
}

#[test]
fn reset_clears_the_session() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);
    run_cli(&home, &["quiz", "answer", "age", "45-54"]);

    let (stdout, _, code) = run_cli(&home, &["quiz", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("session reset"));

    let (stdout, _, _) = run_cli(&home, &["quiz", "status"]);
    assert!(stdout.contains("What is your age range?"));
}

#[test]
fn results_require_completion() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);
    let (_, stderr, code) = run_cli(&home, &["results"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("complete the assessment"));
}

#[test]
fn forced_completion_unlocks_results_and_offer() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["quiz", "start"]);
    let (stdout, _, code) = run_cli(&home, &["quiz", "complete"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("completed"));

    let (stdout, _, code) = run_cli(&home, &["results"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("success probability"));

    let (stdout, _, code) = run_cli(&home, &["offer", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("BRL 19.90"));
    assert!(stdout.contains("offer expires in"));

    let (stdout, _, code) = run_cli(&home, &["stats", "summary"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("sessions completed: 1"));
}
