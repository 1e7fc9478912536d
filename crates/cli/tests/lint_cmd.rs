//! CLI tests for the `peglint lint` subcommand.
//!
//! The analyzer is a shell one-liner that answers with a canned response
//! file, so these only run on unix.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::cargo;

const VALID: &str = r#"{"grammar":[],"code":[],"ast":"+ Start\n  - Number (1)\n","astOptimized":"- Start/Number (1)\n"}"#;

const GRAMMAR_INVALID: &str = r#"{"grammar":[{"ln":1,"col":10,"msg":"'Multitive' is not defined."}],"code":[{"ln":1,"col":1,"msg":"syntax error"}],"ast":"","astOptimized":""}"#;

const CODE_INVALID: &str = r#"{"grammar":[],"code":[{"ln":1,"col":3,"msg":"syntax error, unexpected '+'."}],"ast":"","astOptimized":""}"#;

fn peglint_cmd() -> Command {
    Command::new(cargo::cargo_bin!("peglint"))
}

/// A grammar file, a code file and a scripted analyzer in one temp dir.
struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new(grammar: &str, code: &str, response: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("grammar.peg"), grammar).expect("write grammar");
        fs::write(dir.path().join("input.txt"), code).expect("write code");
        fs::write(dir.path().join("response.json"), response).expect("write response");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Appends each request to `calls.log`, then prints the response.
    fn analyzer_script(&self) -> String {
        format!(
            "cat >> '{log}'; echo >> '{log}'; cat '{resp}'",
            log = self.path("calls.log").display(),
            resp = self.path("response.json").display()
        )
    }

    fn lint(&self, extra: &[&str]) -> Output {
        let script = self.analyzer_script();
        peglint_cmd()
            .arg("lint")
            .arg(self.path("grammar.peg"))
            .arg(self.path("input.txt"))
            .args(["--analyzer", "sh", "--analyzer-arg", "-c", "--analyzer-arg"])
            .arg(script)
            .args(extra)
            .output()
            .expect("run peglint lint")
    }

    fn analyzer_calls(&self) -> usize {
        read_lines(&self.path("calls.log"))
    }
}

fn read_lines(path: &Path) -> usize {
    fs::read_to_string(path).map_or(0, |s| s.lines().count())
}

fn json_line(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
        panic!(
            "stdout should be one JSON object ({e}): {stdout}\nstderr={}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn lint_help_shows_flags() {
    let output = peglint_cmd()
        .args(["lint", "--help"])
        .output()
        .expect("failed to run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--analyzer"), "missing --analyzer");
    assert!(stdout.contains("--analyzer-arg"), "missing --analyzer-arg");
    assert!(stdout.contains("--config"), "missing --config");
    assert!(stdout.contains("--output"), "missing --output");
}

#[test]
fn valid_pair_renders_both_asts() {
    let fx = Fixture::new("Start <- Number\n", "1", VALID);
    let output = fx.lint(&["--output", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let v = json_line(&output);
    assert_eq!(v["outcome"], "rendered");
    assert_eq!(v["cycle"], 1);
    assert_eq!(v["state"]["grammar"]["status"], "valid");
    assert_eq!(v["state"]["code"]["status"], "valid");
    assert_eq!(v["state"]["ast"], "+ Start\n  - Number (1)\n");
    assert_eq!(v["state"]["astOptimized"], "- Start/Number (1)\n");

    let request = fs::read_to_string(fx.path("calls.log")).unwrap();
    let request: serde_json::Value = serde_json::from_str(request.trim()).unwrap();
    assert_eq!(request["grammar"], "Start <- Number\n");
    assert_eq!(request["code"], "1");
}

#[test]
fn grammar_errors_hide_code_errors_and_exit_1() {
    let fx = Fixture::new("Additive <- Multitive\n", "1", GRAMMAR_INVALID);
    let output = fx.lint(&["--output", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let v = json_line(&output);
    assert_eq!(v["state"]["grammar"]["status"], "invalid");
    assert_eq!(
        v["state"]["grammar"]["diagnostics"][0],
        serde_json::json!({"ln": 1, "col": 10, "msg": "'Multitive' is not defined."})
    );
    assert_eq!(v["state"]["code"]["status"], "empty");
    assert_eq!(v["state"]["ast"], "");
}

#[test]
fn code_errors_exit_1() {
    let fx = Fixture::new("Start <- Number\n", "1 +", CODE_INVALID);
    let output = fx.lint(&["--output", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let v = json_line(&output);
    assert_eq!(v["state"]["grammar"]["status"], "valid");
    assert_eq!(v["state"]["code"]["status"], "invalid");
    assert_eq!(v["state"]["code"]["diagnostics"][0]["ln"], 1);
}

#[test]
fn empty_grammar_skips_the_analyzer() {
    let fx = Fixture::new("", "1", VALID);
    let output = fx.lint(&["--output", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let v = json_line(&output);
    assert_eq!(v["outcome"], "empty");
    assert_eq!(v["state"]["grammar"]["status"], "empty");
    assert_eq!(v["state"]["code"]["status"], "empty");
    assert_eq!(fx.analyzer_calls(), 0);
}

#[test]
fn malformed_response_exits_2() {
    let fx = Fixture::new("Start <- Number\n", "1", "this is not json");
    let output = fx.lint(&["--output", "json"]);

    assert_eq!(output.status.code(), Some(2));
    let v = json_line(&output);
    assert_eq!(v["outcome"], "failed");
    assert!(
        v["error"]
            .as_str()
            .unwrap()
            .starts_with("malformed analyzer response")
    );
    assert_eq!(v["state"]["grammar"]["status"], "empty");
}

#[test]
fn failing_analyzer_exits_2() {
    let fx = Fixture::new("Start <- Number\n", "1", VALID);
    let output = peglint_cmd()
        .arg("lint")
        .arg(fx.path("grammar.peg"))
        .arg(fx.path("input.txt"))
        .args(["--analyzer", "sh", "--analyzer-arg", "-c"])
        .args(["--analyzer-arg", "cat >/dev/null; echo boom >&2; exit 4"])
        .args(["--output", "json"])
        .output()
        .expect("run peglint lint");

    assert_eq!(output.status.code(), Some(2));
    let v = json_line(&output);
    assert_eq!(v["outcome"], "failed");
    assert!(v["error"].as_str().unwrap().contains("boom"));
}

#[test]
fn missing_grammar_file_is_an_error() {
    let fx = Fixture::new("Start <- Number\n", "1", VALID);
    fs::remove_file(fx.path("grammar.peg")).unwrap();
    let output = fx.lint(&["--output", "json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "stderr={stderr}");
    assert_eq!(fx.analyzer_calls(), 0);
}

#[test]
fn pretty_output_shows_diagnostics_and_summary() {
    let fx = Fixture::new("Additive <- Multitive\n", "1", GRAMMAR_INVALID);
    let output = fx.lint(&["--output", "pretty"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not defined"), "stderr={stderr}");
    assert!(stderr.contains("grammar error"), "stderr={stderr}");
    // No AST panes while the grammar is invalid.
    assert!(!String::from_utf8_lossy(&output.stdout).contains("AST"));
}

#[test]
fn pretty_output_prints_ast_panes_when_valid() {
    let fx = Fixture::new("Start <- Number\n", "1", VALID);
    let output = fx.lint(&["--output", "pretty"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+ Start\n  - Number (1)\n"), "stdout={stdout}");
    assert!(stdout.contains("- Start/Number (1)\n"), "stdout={stdout}");
}

#[test]
fn config_file_is_validated() {
    let fx = Fixture::new("Start <- Number\n", "1", VALID);
    fs::write(fx.path("peglint.json"), r#"{"debounceMs": 0}"#).unwrap();
    let config = fx.path("peglint.json");
    let output = fx.lint(&["--output", "json", "--config", config.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid config"), "stderr={stderr}");
}
