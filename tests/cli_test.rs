mod common;

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn aissembly_cmd() -> Command {
    Command::cargo_bin("aissembly").unwrap()
}

fn program_file(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", source).unwrap();
    file
}

#[test]
fn test_run_prints_environment_as_json() {
    let output = aissembly_cmd()
        .arg(common::demo_path("loops.asl"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let env: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(env["squares"], 14);
    assert_eq!(env["countdown"], serde_json::json!([5, 4, 3, 2, 1]));
    assert_eq!(env["label"], "big");
}

#[test]
fn test_oracle_definitions_flag() {
    aissembly_cmd()
        .arg(common::demo_path("oracles.asl"))
        .arg("--llm")
        .arg(common::demo_path("oracles.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"model\": \"demo-model\""))
        .stdout(predicate::str::contains("Summarize what lives in a tide pool."));
}

#[test]
fn test_emit_source_without_passes_is_identity() {
    let source = "let a = 1;\nlet b = a + 2;";
    let file = program_file(source);
    aissembly_cmd()
        .arg(file.path())
        .arg("--emit-source")
        .assert()
        .success()
        .stdout(predicate::eq(format!("{}\n", source)));
}

#[test]
fn test_syntax_error_exits_nonzero() {
    let file = program_file("let a = (1 2)\n");
    aissembly_cmd()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("SyntaxError"));
}

#[test]
fn test_max_iterations_flag() {
    let file = program_file("let x = while(test=true, init=0) -> acc + 1\n");
    aissembly_cmd()
        .arg(file.path())
        .arg("--max-iterations")
        .arg("100")
        .assert()
        .failure()
        .stderr(predicate::str::contains("LimitExceeded"));
}

#[test]
fn test_config_file() {
    let config = program_file(r#"{"limits": {"max_iterations": 3}, "parser": {"reparse_iterations": 2}}"#);
    let file = program_file("let x = for(range(0, 10), init=0) -> acc + 1\n");
    aissembly_cmd()
        .arg(file.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("3 iterations"));
}

#[test]
fn test_missing_program_file() {
    aissembly_cmd()
        .arg("/nonexistent/program.asl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read /nonexistent/program.asl"));
}
