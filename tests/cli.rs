//! End-to-end checks of the `querynote` binary that need no network or
//! provider processes.

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn querynote() -> Command {
    let mut cmd = Command::cargo_bin("querynote").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    querynote()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("serve-workspace"))
        .stdout(predicate::str::contains("init-prompts"));
}

#[test]
fn version_flag() {
    querynote()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("querynote "));
}

#[test]
fn chat_requires_engine_credential() {
    querynote()
        .arg("chat")
        .env_remove("OPENAI_API_KEY")
        .env("NOTION_API_KEY", "secret_test")
        .env("NOTION_PAGE_ID", "page-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn chat_requires_workspace_credential() {
    querynote()
        .env("OPENAI_API_KEY", "sk-test")
        .env_remove("NOTION_API_KEY")
        .env("NOTION_PAGE_ID", "page-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOTION_API_KEY"));
}

#[test]
fn publish_requires_parent_page() {
    querynote()
        .args(["publish", "report.txt"])
        .env("NOTION_API_KEY", "secret_test")
        .env_remove("NOTION_PAGE_ID")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOTION_PAGE_ID"));
}

#[test]
fn settings_are_read_from_dotenv_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "NOTION_API_KEY=secret_from_file\nNOTION_PAGE_ID=page-from-file\n",
    )
    .unwrap();

    // With both settings found, the command gets as far as reading its input.
    querynote()
        .current_dir(dir.path())
        .args(["publish", "missing-report.txt"])
        .env_remove("NOTION_API_KEY")
        .env_remove("NOTION_PAGE_ID")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read missing-report.txt"))
        .stderr(predicate::str::contains("missing required setting").not());
}

#[test]
fn tools_checks_workspace_settings_before_launch() {
    querynote()
        .arg("tools")
        .env_remove("NOTION_API_KEY")
        .env_remove("NOTION_PAGE_ID")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required setting"));
}

#[test]
fn serve_workspace_requires_settings() {
    querynote()
        .arg("serve-workspace")
        .env_remove("NOTION_API_KEY")
        .env_remove("NOTION_PAGE_ID")
        .assert()
        .failure();
}

#[test]
fn init_prompts_writes_template() {
    let dir = tempfile::tempdir().unwrap();

    querynote()
        .args(["init-prompts", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("analyst.md"));

    assert!(dir.path().join("analyst.md").exists());
}
