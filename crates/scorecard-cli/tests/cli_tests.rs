//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A `scorecard` invocation isolated inside `dir`.
fn scorecard(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("scorecard").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("SCORECARD_DEEPSEEK_KEY")
        .env_remove("SCORECARD_OPENAI_KEY")
        .env_remove("SCORECARD_ZHIPU_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn record(dir: &Path, student: &str, assignment: &str) {
    scorecard(dir)
        .args(["score", "--student", student, "--set", assignment])
        .assert()
        .success();
}

fn write_config(dir: &Path, api_key: &str, base_url: &str) {
    std::fs::write(
        dir.join("scorecard.toml"),
        format!(
            "default_provider = \"deepseek\"\n\n\
             [providers.deepseek]\n\
             type = \"deepseek\"\n\
             api_key = \"{api_key}\"\n\
             base_url = \"{base_url}\"\n"
        ),
    )
    .unwrap();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created scorecard.toml"))
        .stdout(predicate::str::contains("EVALUATION_SCHEMA.json"))
        .stdout(predicate::str::contains("8 students; subjects: 语文, 数学"));

    assert!(dir.path().join("scorecard.toml").exists());
    assert!(dir.path().join("EVALUATION_SCHEMA.json").exists());
    assert!(dir.path().join("PROMPT_TEMPLATES.json").exists());
    assert!(dir.path().join("students.csv").exists());
}

#[test]
fn init_twice_skips_existing() {
    let dir = TempDir::new().unwrap();
    scorecard(dir.path()).arg("init").assert().success();

    scorecard(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("scorecard.toml already exists, skipping."))
        .stdout(predicate::str::contains("Created").not());
}

#[test]
fn students_list_shows_default_roster() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["students", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("001"))
        .stdout(predicate::str::contains("张伟"))
        .stdout(predicate::str::contains("周浩"));
}

#[test]
fn students_add_is_idempotent() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["students", "add", "--id", "009", "--name", "孙悦"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added student 009"));

    scorecard(dir.path())
        .args(["students", "add", "--id", "009", "--name", "别人"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists (孙悦)"));

    scorecard(dir.path())
        .args(["students", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("孙悦"))
        .stdout(predicate::str::contains("别人").not());
}

#[test]
fn students_add_rejects_blank_fields() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["students", "add", "--id", "  ", "--name", "孙悦"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must both be non-empty"));
}

#[test]
fn rename_by_name_and_unknown_student() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["students", "rename", "--student", "李娜", "--name", "李娜娜"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed student 002"));

    scorecard(dir.path())
        .args(["students", "rename", "--student", "999", "--name", "无名"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("student 999 does not exist"));
}

#[test]
fn schema_prints_one_subject() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["schema", "--subject", "数学"])
        .assert()
        .success()
        .stdout(predicate::str::contains("代数: 方程求解, 函数理解, 运算能力"))
        .stdout(predicate::str::contains("古文").not());
}

#[test]
fn unknown_subject_lists_available() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["schema", "--subject", "英语"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown subject '英语'"));
}

#[test]
fn score_then_show_reports_trend() {
    let dir = TempDir::new().unwrap();

    record(dir.path(), "001", "学习习惯/课堂专注度=2");
    scorecard(dir.path())
        .args(["score", "--student", "张伟", "--set", "学习习惯/课堂专注度=4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entry #2"));

    scorecard(dir.path())
        .args(["show", "--student", "001", "--subject", "语文"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 entries"))
        .stdout(predicate::str::contains("进步"));
}

#[test]
fn show_without_scores_is_not_an_error() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["show", "--student", "003"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No 语文 scores recorded"));
}

#[test]
fn score_rejects_out_of_range_value() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["score", "--student", "001", "--set", "学习习惯/课堂专注度=7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 1 and 5"));

    assert!(!dir.path().join("scores.json").exists());
}

#[test]
fn score_for_unknown_student_writes_nothing() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["score", "--student", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("student 999 does not exist"));

    assert!(!dir.path().join("scores.json").exists());
}

#[test]
fn score_from_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("partial.json");
    std::fs::write(&scores, r#"{"学习习惯": {"课堂专注度": 5}}"#).unwrap();

    scorecard(dir.path())
        .args(["score", "--student", "001", "--file"])
        .arg(&scores)
        .assert()
        .success();

    scorecard(dir.path())
        .args(["prompt", "--student", "001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("学习习惯：\n课堂专注度：5/5\n"))
        .stdout(predicate::str::contains("字词理解：3/5"))
        .stdout(predicate::str::contains("与上次相比").not());
}

#[test]
fn score_from_file_rejects_out_of_range() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("partial.json");
    std::fs::write(&scores, r#"{"学习习惯": {"课堂专注度": 9}}"#).unwrap();

    scorecard(dir.path())
        .args(["score", "--student", "001", "--file"])
        .arg(&scores)
        .assert()
        .failure()
        .stderr(predicate::str::contains("score 9 for 学习习惯/课堂专注度"));
}

#[test]
fn score_from_file_rejects_non_rubric_values() {
    let dir = TempDir::new().unwrap();
    let scores = dir.path().join("partial.json");

    for (body, shown) in [
        (r#"{"学习习惯": {"课堂专注度": 300}}"#, "score 300 for"),
        (r#"{"学习习惯": {"课堂专注度": -1}}"#, "score -1 for"),
        (r#"{"学习习惯": {"课堂专注度": 4.5}}"#, "score 4.5 for"),
        (r#"{"学习习惯": {"课堂专注度": "4"}}"#, "score \"4\" for"),
    ] {
        std::fs::write(&scores, body).unwrap();
        scorecard(dir.path())
            .args(["score", "--student", "001", "--file"])
            .arg(&scores)
            .assert()
            .failure()
            .stderr(predicate::str::contains(shown))
            .stderr(predicate::str::contains("not a whole number in 1-5"));
    }

    assert!(!dir.path().join("scores.json").exists());
}

#[test]
fn prompt_compares_with_previous_entry() {
    let dir = TempDir::new().unwrap();
    record(dir.path(), "001", "专业模块/古文/字词理解=4");
    record(dir.path(), "001", "专业模块/古文/字词理解=2");

    scorecard(dir.path())
        .args(["prompt", "--student", "001", "--subject", "语文"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("你是一位语文老师"))
        .stdout(predicate::str::contains(
            "专业模块：\n古文：\n字词理解：2/5（与上次相比：下降）\n句式分析：3/5（与上次相比：持平）",
        ));
}

#[test]
fn prompt_without_scores_fails() {
    let dir = TempDir::new().unwrap();

    scorecard(dir.path())
        .args(["prompt", "--student", "001", "--subject", "数学"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scores recorded for student 001 in 数学"));
}

#[tokio::test(flavor = "multi_thread")]
async fn report_with_empty_key_never_calls_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "", &server.uri());
    record(dir.path(), "001", "学习习惯/课堂专注度=4");

    scorecard(dir.path())
        .args(["report", "--student", "001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing API key for provider deepseek"))
        .stderr(predicate::str::contains("--api-key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn report_prints_and_saves_feedback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "**语文近期学习水平及状态反馈**\n课堂专注度有所提升。"}}],
            "model": "deepseek-chat"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "test-key", &server.uri());
    record(dir.path(), "001", "学习习惯/课堂专注度=3");
    record(dir.path(), "001", "学习习惯/课堂专注度=4");

    scorecard(dir.path())
        .args(["report", "--student", "张伟", "--output", "out/report.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**张伟 的反馈报告**"))
        .stdout(predicate::str::contains("课堂专注度有所提升。"));

    let saved = std::fs::read_to_string(dir.path().join("out/report.md")).unwrap();
    assert!(saved.starts_with("# 张伟 的语文反馈报告"));
    assert!(saved.contains("课堂专注度有所提升。"));

    // Generating a report leaves the history untouched.
    let history = std::fs::read_to_string(dir.path().join("scores.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&history).unwrap();
    assert_eq!(parsed["001"]["语文"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn report_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "test-key", &server.uri());
    record(dir.path(), "001", "学习习惯/课堂专注度=4");

    scorecard(dir.path())
        .args(["report", "--student", "001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));
}
