//! End-to-end pipeline tests: practice-set file, local rules, mock judge,
//! session summary and report persistence.

use std::path::Path;
use std::sync::Arc;

use slipcheck_core::engine::{
    AssessmentEngine, AssessmentEngineConfig, NoopReporter, VerdictSource,
};
use slipcheck_core::model::{ErrorClass, SlipType};
use slipcheck_core::parser::{parse_practice_set, parse_practice_set_str};
use slipcheck_core::report::AssessmentReport;
use slipcheck_providers::mock::MockProvider;

const EQUIVALENT: &str = r#"{"equivalent": true, "error_class": null, "slip_type": null, "explanation": "Same value."}"#;
const ARITHMETIC: &str = r#"```json
{"equivalent": false, "error_class": "review_error", "slip_type": "arithmetic_slip", "explanation": "Recheck the last step."}
```"#;

fn fast_config() -> AssessmentEngineConfig {
    AssessmentEngineConfig {
        retry_delay: std::time::Duration::from_millis(1),
        model: "mock-judge".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn sample_set_offline() {
    let set = parse_practice_set(Path::new("../../practice-sets/fractions-basics.toml")).unwrap();
    let engine = AssessmentEngine::offline(fast_config());

    let report = engine.run(&set, &NoopReporter).await.unwrap();
    let tally = report.tally();
    assert_eq!(report.outcomes.len(), 7);
    assert_eq!(tally.correct, 2);
    assert_eq!(tally.review_errors, 4);
    assert_eq!(tally.unresolved, 1);
    assert!(report.judge.is_none());

    let slips: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| o.slip.slip_type)
        .collect();
    assert_eq!(
        slips,
        vec![
            SlipType::ExtraZero,
            SlipType::TransposedDigits,
            SlipType::SignSlip,
            SlipType::DecimalSlip,
        ]
    );
}

#[tokio::test]
async fn judge_resolves_what_rules_cannot() {
    let set = parse_practice_set_str(
        r#"
[practice_set]
id = "judged"
name = "Judged"

[[questions]]
id = "half"
prompt = "Write one half as a decimal or a fraction."
correct_answer = "1/2"
topic = "fractions"

[[questions]]
id = "area"
prompt = "A rectangle is 7 by 8. What is its area?"
correct_answer = "56"
topic = "area"

[[questions]]
id = "solve"
prompt = "Solve 2x + 3 = 11."
correct_answer = "x = 4"
topic = "algebra"

[[submissions]]
question_id = "half"
answer = "0.5"
explanation = "Half of one whole is five tenths."
time_ms = 20000

[[submissions]]
question_id = "area"
answer = "5 6"
time_ms = 15000

[[submissions]]
question_id = "solve"
answer = "x = 5"
explanation = "I took 3 from 11 and then halved it."
time_ms = 25000
"#,
        Path::new("judged.toml"),
    )
    .unwrap();

    let judge = Arc::new(MockProvider::new(vec![
        ("Student answer: 0.5".into(), EQUIVALENT.into()),
        ("Student answer: x = 5".into(), ARITHMETIC.into()),
    ]));
    let engine = AssessmentEngine::new(Some(judge.clone()), fast_config());

    let report = engine.run(&set, &NoopReporter).await.unwrap();
    assert_eq!(report.judge.as_deref(), Some("mock/mock-judge"));

    let half = &report.outcomes[0];
    assert_eq!(half.source, VerdictSource::Ai);
    assert!(half.is_correct);
    assert_eq!(half.judge_explanation.as_deref(), Some("Same value."));

    // Whitespace never matters.
    let spaced = &report.outcomes[1];
    assert_eq!(spaced.source, VerdictSource::ExactMatch);
    assert!(spaced.is_correct);

    let solved = &report.outcomes[2];
    assert_eq!(solved.source, VerdictSource::Ai);
    assert_eq!(solved.error_class, Some(ErrorClass::ReviewError));
    assert_eq!(solved.slip.slip_type, Some(SlipType::ArithmeticSlip));
    assert_eq!(solved.coach_note.title, "So close: just a slip");

    assert_eq!(judge.call_count(), 2);
    assert_eq!(report.session.focus.accuracy, 67);
}

#[tokio::test]
async fn saved_report_loads_back() {
    let set = parse_practice_set(Path::new("../../practice-sets/place-value.toml")).unwrap();
    let judge = Arc::new(MockProvider::new(vec![]));
    let engine = AssessmentEngine::new(Some(judge), fast_config());
    let report = engine.run(&set, &NoopReporter).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("report.json");
    report.save_json(&path).unwrap();

    let loaded = AssessmentReport::load_json(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.outcomes, report.outcomes);
    assert_eq!(loaded.session, report.session);
    assert!(loaded.to_markdown().contains("## Place Value"));
}
