//! Core data model types for slipcheck.
//!
//! Every type here is created per call from caller-supplied data. Nothing is
//! persisted by this crate; storage belongs to whoever calls it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One assessment input: a question, its answer key, and what the student wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// The question as shown to the student.
    pub question_prompt: String,
    /// The answer key.
    pub correct_answer: String,
    /// The raw answer the student submitted.
    pub student_answer: String,
    /// Free-text reasoning typed alongside the answer.
    #[serde(default)]
    pub student_explanation: Option<String>,
    /// Ordered reasoning entries captured during the attempt.
    #[serde(default)]
    pub thinking_log: Vec<ThinkingEntry>,
}

/// Where in the attempt a piece of reasoning was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingKind {
    Initial,
    Followup,
    Teachback,
}

impl ThinkingKind {
    /// Label prefixed to the entry when the log is flattened into one narrative.
    /// Labels must not contain any feedback keyword.
    pub fn label(self) -> &'static str {
        match self {
            ThinkingKind::Initial => "Initial idea",
            ThinkingKind::Followup => "Follow-up",
            ThinkingKind::Teachback => "Teach-back",
        }
    }
}

/// A single reasoning entry. Timestamps are non-decreasing by convention only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingEntry {
    pub kind: ThinkingKind,
    pub text: String,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
}

/// The closed set of superficial answer errors the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlipType {
    FormatTypo,
    ExtraDigit,
    MissingDigit,
    ExtraZero,
    SignSlip,
    DecimalSlip,
    TransposedDigits,
    ArithmeticSlip,
}

impl SlipType {
    pub const ALL: [SlipType; 8] = [
        SlipType::FormatTypo,
        SlipType::ExtraDigit,
        SlipType::MissingDigit,
        SlipType::ExtraZero,
        SlipType::SignSlip,
        SlipType::DecimalSlip,
        SlipType::TransposedDigits,
        SlipType::ArithmeticSlip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlipType::FormatTypo => "format_typo",
            SlipType::ExtraDigit => "extra_digit",
            SlipType::MissingDigit => "missing_digit",
            SlipType::ExtraZero => "extra_zero",
            SlipType::SignSlip => "sign_slip",
            SlipType::DecimalSlip => "decimal_slip",
            SlipType::TransposedDigits => "transposed_digits",
            SlipType::ArithmeticSlip => "arithmetic_slip",
        }
    }
}

impl fmt::Display for SlipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        SlipType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown slip type: {s}"))
    }
}

/// Outcome of the slip classifier.
///
/// `message` describes the kind of discrepancy only. It never contains the
/// value of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipVerdict {
    pub is_slip: bool,
    #[serde(rename = "type")]
    pub slip_type: Option<SlipType>,
    pub message: Option<String>,
}

impl SlipVerdict {
    /// The "escalate" signal: no superficial slip was recognised.
    pub fn not_slip() -> Self {
        Self {
            is_slip: false,
            slip_type: None,
            message: None,
        }
    }

    pub fn slip(slip_type: SlipType, message: impl Into<String>) -> Self {
        Self {
            is_slip: true,
            slip_type: Some(slip_type),
            message: Some(message.into()),
        }
    }
}

/// How a wrong answer was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// A superficial slip; the method was sound.
    ReviewError,
    /// A conceptual error in the method.
    Misconception,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::ReviewError => write!(f, "review_error"),
            ErrorClass::Misconception => write!(f, "misconception"),
        }
    }
}

impl FromStr for ErrorClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "review_error" | "review" | "slip" => Ok(ErrorClass::ReviewError),
            "misconception" | "conceptual" => Ok(ErrorClass::Misconception),
            other => Err(format!("unknown error class: {other}")),
        }
    }
}

/// Structured feedback shown after an attempt. Always fully populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachNote {
    pub title: String,
    /// At most two entries.
    pub what_went_well: Vec<String>,
    /// At most two entries.
    pub what_to_fix: Vec<String>,
    pub remember: String,
    pub next_step: String,
}

/// A single timed Focus Mode attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedAttempt {
    pub is_correct: bool,
    pub time_ms: u64,
    #[serde(default)]
    pub nudges: u32,
    pub topic: String,
}

impl TimedAttempt {
    pub fn seconds(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// Rolling efficiency rating. Always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencyState {
    pub rating: i32,
}

/// When to show the first and second in-session hints.
///
/// `second_nudge_ms >= first_nudge_ms + 6000` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeThresholds {
    pub first_nudge_ms: u64,
    pub second_nudge_ms: u64,
    pub baseline_ms: u64,
}

/// Display scores for a Focus Mode session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusScores {
    /// Percentage of correct attempts, 0–100.
    pub accuracy: u32,
    /// Speed of correct attempts mapped onto 0–100.
    pub speed: u32,
    /// Mean time of correct attempts; `None` when nothing was correct.
    pub avg_time_seconds: Option<f64>,
    pub total_attempts: usize,
    pub correct_attempts: usize,
}

/// A practice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub correct_answer: String,
    /// Difficulty level 1–10. Treated as 5 when absent.
    #[serde(default)]
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// What a student submitted for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub question_id: String,
    pub answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub thinking_log: Vec<ThinkingEntry>,
    /// Time spent on the question in milliseconds.
    #[serde(default)]
    pub time_ms: u64,
    #[serde(default)]
    pub nudges: u32,
}

/// A practice set: questions plus the submissions recorded against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Seed for the difficulty session ordering.
    #[serde(default)]
    pub seed: u32,
    /// Topic used for questions that don't name one.
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

pub(crate) fn default_topic() -> String {
    "general".to_string()
}

impl PracticeSet {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Topic for a question, falling back to the set default.
    pub fn topic_of(&self, question: &Question) -> String {
        question
            .topic
            .clone()
            .unwrap_or_else(|| self.default_topic.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slip_type_display_and_parse() {
        assert_eq!(SlipType::ExtraZero.to_string(), "extra_zero");
        assert_eq!(
            "transposed-digits".parse::<SlipType>().unwrap(),
            SlipType::TransposedDigits
        );
        assert_eq!(
            "Sign Slip".parse::<SlipType>().unwrap(),
            SlipType::SignSlip
        );
        assert!("typo".parse::<SlipType>().is_err());
    }

    #[test]
    fn error_class_parse() {
        assert_eq!(
            "review".parse::<ErrorClass>().unwrap(),
            ErrorClass::ReviewError
        );
        assert_eq!(
            "MISCONCEPTION".parse::<ErrorClass>().unwrap(),
            ErrorClass::Misconception
        );
        assert!("unknown".parse::<ErrorClass>().is_err());
    }

    #[test]
    fn slip_verdict_serializes_type_field() {
        let verdict = SlipVerdict::slip(SlipType::SignSlip, "Check the sign.");
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["type"], "sign_slip");
        assert_eq!(json["is_slip"], true);

        let none = serde_json::to_value(SlipVerdict::not_slip()).unwrap();
        assert!(none["type"].is_null());
    }

    #[test]
    fn attempt_defaults_optional_fields() {
        let attempt: Attempt = serde_json::from_str(
            r#"{"question_prompt":"2+2","correct_answer":"4","student_answer":"5"}"#,
        )
        .unwrap();
        assert!(attempt.student_explanation.is_none());
        assert!(attempt.thinking_log.is_empty());
    }
}
