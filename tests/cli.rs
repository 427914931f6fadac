//! End-to-end tests of the `bid-analyser` binary that need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TENDER_TEXT: &str = "NOTICE INVITING TENDER\n\n\
    Tender No. PWD/2024/117 for resurfacing of NH-44 between km 12 and km 30.\n\
    Earnest Money Deposit: Rs 2,50,000 by demand draft.\n\
    Last date of bid submission: 15 March 2024, 3:00 PM.\n";

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("bid-analyser").unwrap_or_else(|_| unreachable!());
    cmd.env_remove("GROQ_API_KEY")
        .env_remove("BID_API_KEY")
        .env_remove("BID_PROMPT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn tender_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("nit.txt");
    std::fs::write(&path, body).unwrap_or_else(|_| unreachable!());
    path
}

#[test]
fn help_lists_commands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("translate"))
        .stdout(predicate::str::contains("session"))
        .stdout(predicate::str::contains("init-prompts"));
}

#[test]
fn chunks_works_offline() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = tender_file(&dir, &TENDER_TEXT.repeat(4));

    bin()
        .args(["chunks", "--chunk-size", "300", "--overlap", "30"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Document: nit.txt"))
        .stdout(predicate::str::contains("[1]"));
}

#[test]
fn chunks_json_output() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = tender_file(&dir, TENDER_TEXT);

    let output = bin()
        .args(["--format", "json", "chunks"])
        .arg(&path)
        .output()
        .unwrap_or_else(|_| unreachable!());

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap_or_default();
    assert_eq!(value["document"], "nit.txt");
    assert_eq!(value["chunks"].as_array().map(Vec::len), Some(1));
}

#[test]
fn chunks_rejects_overlap_not_below_size() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = tender_file(&dir, TENDER_TEXT);

    bin()
        .args(["chunks", "--chunk-size", "100", "--overlap", "100"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlap (100) must be smaller than chunk size (100)"));
}

#[test]
fn chunks_rejects_tiny_document() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = tender_file(&dir, "blank page");

    bin()
        .arg("chunks")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("too little text"));
}

#[test]
fn missing_api_key_fails_before_reading() {
    bin()
        .args(["summarize", "/no/such/tender.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn ask_without_key_fails() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = tender_file(&dir, TENDER_TEXT);

    bin()
        .arg("ask")
        .arg(&path)
        .arg("What is the EMD?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROQ_API_KEY"));
}

#[test]
fn init_prompts_writes_templates_once() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let target = dir.path().join("prompts");

    bin()
        .args(["init-prompts", "--dir"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 7 prompt template(s)"));

    assert!(target.join("extract_json.md").exists());
    assert!(target.join("translate.md").exists());

    bin()
        .args(["init-prompts", "--dir"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist"));
}
