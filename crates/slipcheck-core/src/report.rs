//! Assessment report types with JSON persistence and a markdown summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{AssessmentOutcome, VerdictSource};
use crate::focus::{compute_adaptive_thresholds, FocusConfig};
use crate::model::{ErrorClass, FocusScores, NudgeThresholds, PracticeSet, TimedAttempt};

/// A complete assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the practice set.
    pub practice_set: PracticeSetSummary,
    /// `provider/model` of the judge, if one was configured.
    #[serde(default)]
    pub judge: Option<String>,
    /// One outcome per assessed submission, in submission order.
    pub outcomes: Vec<AssessmentOutcome>,
    /// Focus scoring over the assessed submissions.
    pub session: SessionSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a practice set (without the questions themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeSetSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub submission_count: usize,
}

/// Focus Mode numbers for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub focus: FocusScores,
    /// Efficiency rating after folding the session in submission order.
    pub rating: i32,
    /// Nudge timing for the next session.
    pub thresholds: NudgeThresholds,
}

impl SessionSummary {
    pub fn from_attempts(attempts: &[TimedAttempt], config: &FocusConfig) -> Self {
        let durations: Vec<u64> = attempts.iter().map(|a| a.time_ms).collect();
        Self {
            focus: config.focus_scores(attempts),
            rating: config.efficiency_rating(attempts),
            thresholds: compute_adaptive_thresholds(&durations),
        }
    }
}

/// Join outcomes back to their submissions and questions.
///
/// Outcomes whose submission or question can't be found are skipped.
pub fn build_timed_attempts(set: &PracticeSet, outcomes: &[AssessmentOutcome]) -> Vec<TimedAttempt> {
    outcomes
        .iter()
        .filter_map(|outcome| {
            let submission = set.submissions.get(outcome.submission_index)?;
            let question = set.question(&submission.question_id)?;
            Some(TimedAttempt {
                is_correct: outcome.is_correct,
                time_ms: submission.time_ms,
                nudges: submission.nudges,
                topic: set.topic_of(question),
            })
        })
        .collect()
}

/// Focus scores, rating and next thresholds for an assessed practice set.
pub fn compute_session_summary(
    set: &PracticeSet,
    outcomes: &[AssessmentOutcome],
    config: &FocusConfig,
) -> SessionSummary {
    SessionSummary::from_attempts(&build_timed_attempts(set, outcomes), config)
}

/// Outcome counts by how they were decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub correct: usize,
    pub review_errors: usize,
    pub misconceptions: usize,
    pub unresolved: usize,
    pub escalated: usize,
}

impl AssessmentReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn tally(&self) -> OutcomeTally {
        let mut tally = OutcomeTally::default();
        for o in &self.outcomes {
            if matches!(o.source, VerdictSource::Ai | VerdictSource::Unresolved) {
                tally.escalated += 1;
            }
            match (o.is_correct, o.source, o.error_class) {
                (true, _, _) => tally.correct += 1,
                (false, VerdictSource::Unresolved, _) => tally.unresolved += 1,
                (false, _, Some(ErrorClass::ReviewError)) => tally.review_errors += 1,
                (false, _, _) => tally.misconceptions += 1,
            }
        }
        tally
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let tally = self.tally();

        md.push_str(&format!("## {}\n\n", self.practice_set.name));
        md.push_str(&format!(
            "**Summary:** {} correct, {} review errors, {} misconceptions, {} unresolved\n\n",
            tally.correct, tally.review_errors, tally.misconceptions, tally.unresolved
        ));
        if let Some(judge) = &self.judge {
            md.push_str(&format!("Judge: `{judge}` ({} escalated)\n\n", tally.escalated));
        }

        let focus = &self.session.focus;
        md.push_str("### Focus\n\n");
        md.push_str("| Accuracy | Speed | Avg time | Rating | First nudge | Second nudge |\n");
        md.push_str("|----------|-------|----------|--------|-------------|--------------|\n");
        md.push_str(&format!(
            "| {}% | {} | {} | {} | {:.1}s | {:.1}s |\n\n",
            focus.accuracy,
            focus.speed,
            focus
                .avg_time_seconds
                .map(|s| format!("{s:.1}s"))
                .unwrap_or_else(|| "-".into()),
            self.session.rating,
            self.session.thresholds.first_nudge_ms as f64 / 1000.0,
            self.session.thresholds.second_nudge_ms as f64 / 1000.0,
        ));

        if !self.outcomes.is_empty() {
            md.push_str("### Submissions\n\n");
            md.push_str("| # | Question | Source | Result | Slip | Coach note |\n");
            md.push_str("|---|----------|--------|--------|------|------------|\n");
            for o in &self.outcomes {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} |\n",
                    o.submission_index + 1,
                    o.question_id,
                    o.source,
                    o.result_label(),
                    o.slip
                        .slip_type
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".into()),
                    o.coach_note.title,
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoachNote, Question, SlipType, SlipVerdict, Submission};

    fn outcome(index: usize, source: VerdictSource, is_correct: bool) -> AssessmentOutcome {
        AssessmentOutcome {
            question_id: format!("q{index}"),
            submission_index: index,
            source,
            is_correct,
            error_class: None,
            slip: SlipVerdict::not_slip(),
            coach_note: CoachNote {
                title: "Nice work!".into(),
                ..Default::default()
            },
            judge_explanation: None,
            token_usage: None,
        }
    }

    fn practice_set() -> PracticeSet {
        let question = |id: &str, topic: Option<&str>| Question {
            id: id.into(),
            prompt: "?".into(),
            correct_answer: "1".into(),
            difficulty: None,
            topic: topic.map(String::from),
            tags: vec![],
        };
        let submission = |id: &str, time_ms: u64, nudges: u32| Submission {
            question_id: id.into(),
            answer: "1".into(),
            explanation: None,
            thinking_log: vec![],
            time_ms,
            nudges,
        };
        PracticeSet {
            id: "set".into(),
            name: "Warm-up".into(),
            description: String::new(),
            seed: 0,
            default_topic: "fractions".into(),
            questions: vec![question("q0", Some("arithmetic")), question("q1", None)],
            submissions: vec![submission("q0", 20_000, 0), submission("q1", 35_000, 1)],
        }
    }

    fn make_report(outcomes: Vec<AssessmentOutcome>) -> AssessmentReport {
        let set = practice_set();
        AssessmentReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            practice_set: PracticeSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                question_count: 2,
                submission_count: 2,
            },
            judge: Some("mock/judge".into()),
            session: compute_session_summary(&set, &outcomes, &FocusConfig::default()),
            outcomes,
            duration_ms: 0,
        }
    }

    #[test]
    fn timed_attempts_join_topics() {
        let set = practice_set();
        let attempts = build_timed_attempts(
            &set,
            &[
                outcome(0, VerdictSource::ExactMatch, true),
                outcome(1, VerdictSource::Rule, false),
                outcome(7, VerdictSource::Rule, false),
            ],
        );
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].topic, "arithmetic");
        assert_eq!(attempts[1].topic, "fractions");
        assert_eq!(attempts[1].nudges, 1);
        assert!(!attempts[1].is_correct);
    }

    #[test]
    fn session_summary_values() {
        let set = practice_set();
        let summary = compute_session_summary(
            &set,
            &[
                outcome(0, VerdictSource::ExactMatch, true),
                outcome(1, VerdictSource::Rule, false),
            ],
            &FocusConfig::default(),
        );
        // 50 + 6 (on target) - 5 - 1
        assert_eq!(summary.rating, 50);
        assert_eq!(summary.focus.accuracy, 50);
        assert_eq!(summary.focus.speed, 60);
        assert_eq!(summary.thresholds.baseline_ms, 27_500);
    }

    #[test]
    fn tally_counts_each_kind() {
        let mut slip = outcome(1, VerdictSource::Rule, false);
        slip.error_class = Some(ErrorClass::ReviewError);
        let mut idea = outcome(2, VerdictSource::Ai, false);
        idea.error_class = Some(ErrorClass::Misconception);
        let report = make_report(vec![
            outcome(0, VerdictSource::ExactMatch, true),
            slip,
            idea,
            outcome(3, VerdictSource::Unresolved, false),
        ]);
        assert_eq!(
            report.tally(),
            OutcomeTally {
                correct: 1,
                review_errors: 1,
                misconceptions: 1,
                unresolved: 1,
                escalated: 2,
            }
        );
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![outcome(0, VerdictSource::ExactMatch, true)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = AssessmentReport::load_json(&path).unwrap();

        assert_eq!(loaded.practice_set.id, "set");
        assert_eq!(loaded.outcomes, report.outcomes);
        assert_eq!(loaded.session, report.session);
    }

    #[test]
    fn outcome_json_shape() {
        let mut o = outcome(0, VerdictSource::Rule, false);
        o.slip = SlipVerdict::slip(SlipType::SignSlip, "Check the sign.");
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["source"], "rule");
        assert_eq!(json["slip"]["type"], "sign_slip");
        assert!(json.get("token_usage").is_none());
    }

    #[test]
    fn markdown_output() {
        let mut slip = outcome(1, VerdictSource::Rule, false);
        slip.error_class = Some(ErrorClass::ReviewError);
        slip.slip = SlipVerdict::slip(SlipType::ExtraZero, "zero");
        let md = make_report(vec![outcome(0, VerdictSource::ExactMatch, true), slip]).to_markdown();
        assert!(md.contains("## Warm-up"));
        assert!(md.contains("1 correct, 1 review errors"));
        assert!(md.contains("mock/judge"));
        assert!(md.contains("| 2 | q1 | rule | review_error | extra_zero |"));
    }
}
