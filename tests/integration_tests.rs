use assert_cmd::prelude::*;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

mod common;
use common::test_helpers::*;

/// The binary with a clean environment: no user config file, no keys, no colours
fn cli_command(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("explainthisrepo").expect("binary not found");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env("NO_COLOR", "1")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_API_BASE_URL")
        .env_remove("GEMINI_API_BASE_URL")
        .env_remove("EXPLAINTHISREPO_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

fn node_project() -> TempDir {
    let project = TempDir::new().expect("failed to create project dir");
    write_file(
        project.path(),
        "package.json",
        r#"{"dependencies": {"react": "^18.0.0", "express": "^4.0.0"}, "devDependencies": {"jest": "^29.0.0"}}"#,
    );
    write_file(project.path(), "Dockerfile", "FROM node:20\n");
    write_file(project.path(), "README.md", "# Demo\n\nA demo service.\n");
    write_file(project.path(), "src/index.js", "require('express')();\n");
    project
}

#[test]
fn stack_mode_on_local_directory_prints_report() {
    let home = TempDir::new().unwrap();
    let project = node_project();

    cli_command(&home)
        .arg(project.path())
        .arg("--stack")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stack summary for"))
        .stdout(predicate::str::contains("- React"))
        .stdout(predicate::str::contains("- Express"))
        .stdout(predicate::str::contains("- Jest"))
        .stdout(predicate::str::contains("- Docker"))
        .stdout(predicate::str::contains("- Node.js"))
        .stdout(predicate::str::contains("- JavaScript"));
}

#[test]
fn version_flag_prints_version() {
    let home = TempDir::new().unwrap();
    cli_command(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn mode_flags_are_mutually_exclusive() {
    let home = TempDir::new().unwrap();
    cli_command(&home)
        .args(["owner/repo", "--quick", "--stack"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn repository_is_required_without_doctor() {
    let home = TempDir::new().unwrap();
    cli_command(&home).assert().failure();
}

#[test]
fn foreign_host_is_rejected_with_hint() {
    let home = TempDir::new().unwrap();
    cli_command(&home)
        .arg("https://gitlab.com/owner/repo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("Only GitHub repository URLs are supported"))
        .stderr(predicate::str::contains("owner/repo"));
}

#[test]
fn explain_without_gemini_key_fails() {
    let home = TempDir::new().unwrap();
    let project = node_project();

    cli_command(&home)
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn explain_local_directory_writes_output_file() {
    let home = TempDir::new().unwrap();
    let project = node_project();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("docs").join("EXPLAIN.md");

    let mut server = Server::new();
    let gemini = server
        .mock("POST", "/v1beta/models/gemini-2.5-flash-lite:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::Regex("FILE: package.json".to_string()))
        .with_status(200)
        .with_body(r##"{"candidates":[{"content":{"parts":[{"text":"# Overview\n\nA small demo service.\n"}]}}]}"##)
        .create();

    cli_command(&home)
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_API_BASE_URL", format!("{}/v1beta", server.url()))
        .arg(project.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated successfully"))
        .stdout(predicate::str::contains("Words: 6"));

    gemini.assert();
    let written = fs::read_to_string(&output).expect("explanation not written");
    assert_eq!(written, "# Overview\n\nA small demo service.\n");
}

#[test]
fn quick_mode_uses_local_readme() {
    let home = TempDir::new().unwrap();
    let project = node_project();

    let mut server = Server::new();
    let gemini = server
        .mock("POST", "/models/gemini-2.5-flash-lite:generateContent")
        .match_body(Matcher::Regex("A demo service".to_string()))
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"A demo web service."}]}}]}"#)
        .create();

    cli_command(&home)
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_API_BASE_URL", server.url())
        .arg(project.path())
        .arg("--quick")
        .assert()
        .success()
        .stdout(predicate::str::contains("A demo web service."));

    gemini.assert();
}
