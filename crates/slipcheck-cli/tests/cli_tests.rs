//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FRACTIONS: &str = "../../practice-sets/fractions-basics.toml";

fn slipcheck() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("slipcheck").unwrap();
    cmd.env_remove("SLIPCHECK_ANTHROPIC_KEY");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn classify_extra_zero_as_json() {
    let output = slipcheck()
        .args(["classify", "--student", "150", "--correct", "15", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["result"], "review_error");
    assert_eq!(json["slip"]["type"], "extra_zero");
    assert_eq!(json["coach_note"]["title"], "Tell me more next time");
}

#[test]
fn classify_sign_slip_with_negative_values() {
    slipcheck()
        .args(["classify", "--student=5", "--correct", "-5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Slip: sign_slip"));
}

#[test]
fn classify_unrecognised_answer_escalates() {
    slipcheck()
        .args([
            "classify",
            "--student",
            "0.5",
            "--correct",
            "1/2",
            "--explanation",
            "I added the tops and then the bottoms",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Result: escalate"))
        .stdout(predicate::str::contains("Let's fix the idea"));
}

#[test]
fn classify_never_echoes_the_key() {
    slipcheck()
        .args(["classify", "--student", "4O", "--correct", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("format_typo"))
        .stdout(predicate::str::contains("40").not());
}

#[test]
fn order_is_deterministic() {
    let run = || {
        slipcheck()
            .args(["order", "--practice-set", FRACTIONS, "--format", "json"])
            .output()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let json = stdout_json(&first);
    assert_eq!(json["seed"], 42);
    let order = json["order"].as_array().unwrap();
    assert_eq!(order.len(), 6);
    assert_eq!(order[0]["id"], "add-big");
    assert_eq!(order[5]["id"], "dec");
}

#[test]
fn order_text_lists_difficulty() {
    slipcheck()
        .args(["order", "--practice-set", FRACTIONS, "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(seed 3)"))
        .stdout(predicate::str::contains("add-big [difficulty 2]"));
}

#[test]
fn focus_scores_as_json() {
    let output = slipcheck()
        .args(["focus", "--practice-set", FRACTIONS, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["focus"]["total_attempts"], 7);
    assert_eq!(json["focus"]["correct_attempts"], 2);
    assert_eq!(json["focus"]["accuracy"], 29);
    let rating = json["rating"].as_i64().unwrap();
    assert!((0..=100).contains(&rating));
    let first = json["thresholds"]["first_nudge_ms"].as_u64().unwrap();
    let second = json["thresholds"]["second_nudge_ms"].as_u64().unwrap();
    assert!(second >= first + 6000);
}

#[test]
fn validate_valid_practice_set() {
    slipcheck()
        .args(["validate", "--practice-set", FRACTIONS])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions, 7 submissions"))
        .stdout(predicate::str::contains("All practice sets valid"));
}

#[test]
fn validate_directory() {
    slipcheck()
        .args(["validate", "--practice-set", "../../practice-sets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fractions and Signs Warm-up"))
        .stdout(predicate::str::contains("Place Value"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[practice_set]
id = "broken"
name = "Broken"

[[questions]]
id = "a"
prompt = "1 + 1"
correct_answer = "2"

[[questions]]
id = "a"
prompt = "2 + 2"
correct_answer = "4"
difficulty = 11

[[submissions]]
question_id = "zzz"
answer = "3"
"#,
    )
    .unwrap();

    slipcheck()
        .args(["validate", "--practice-set"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[a] WARNING: duplicate question ID: a"))
        .stdout(predicate::str::contains("difficulty 11 is outside 1-10"))
        .stdout(predicate::str::contains("references unknown question"))
        .stdout(predicate::str::contains("3 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    slipcheck()
        .args(["validate", "--practice-set", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn assess_offline_writes_report() {
    let dir = TempDir::new().unwrap();

    let output = slipcheck()
        .args(["assess", "--practice-set", FRACTIONS, "--offline", "--format", "json"])
        .arg("--output")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 7);
    assert_eq!(outcomes[0]["source"], "exact_match");
    assert_eq!(outcomes[1]["source"], "rule");
    assert_eq!(outcomes[1]["slip"]["type"], "extra_zero");
    assert_eq!(outcomes[5]["source"], "unresolved");
    assert!(json["judge"].is_null());

    let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn assess_with_mock_judge() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("slipcheck.toml");
    std::fs::write(
        &config,
        "default_provider = \"offline\"\n\n[providers.offline]\ntype = \"mock\"\n",
    )
    .unwrap();

    slipcheck()
        .args(["assess", "--practice-set", FRACTIONS, "--format", "markdown"])
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("reports"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 correct, 4 review errors, 1 misconceptions, 0 unresolved",
        ))
        .stdout(predicate::str::contains("| 6 | frac-half | ai | misconception |"));
}

#[test]
fn assess_unknown_provider_fails() {
    let dir = TempDir::new().unwrap();

    slipcheck()
        .args(["assess", "--practice-set", FRACTIONS, "--provider", "nope"])
        .arg("--output")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'nope' not found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    slipcheck()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created slipcheck.toml"))
        .stdout(predicate::str::contains("Created practice-sets/example.toml"));

    assert!(dir.path().join("slipcheck.toml").exists());

    slipcheck()
        .current_dir(dir.path())
        .args(["validate", "--practice-set", "practice-sets/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All practice sets valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    slipcheck()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    slipcheck()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn list_models_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("slipcheck.toml");
    std::fs::write(&config, "[providers.offline]\ntype = \"mock\"\n").unwrap();

    slipcheck()
        .arg("list-models")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: offline"))
        .stdout(predicate::str::contains("mock-judge"));
}

#[test]
fn help_output() {
    slipcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Answer assessment and adaptive scoring",
        ));
}

#[test]
fn version_output() {
    slipcheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slipcheck"));
}
