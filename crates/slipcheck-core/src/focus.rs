//! Focus Mode scoring: speed factors, the rolling efficiency rating, display
//! scores, and adaptive nudge timing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{EfficiencyState, FocusScores, NudgeThresholds, TimedAttempt};

pub const MIN_SPEED_FACTOR: f64 = 0.25;
pub const MAX_SPEED_FACTOR: f64 = 1.5;

/// Target time for topics with no entry in the table.
pub const DEFAULT_TARGET_SECS: f64 = 35.0;

/// Built-in per-topic target times in seconds.
const TOPIC_TARGET_SECS: &[(&str, f64)] = &[
    ("arithmetic", 20.0),
    ("place_value", 25.0),
    ("decimals", 30.0),
    ("fractions", 35.0),
    ("ratios", 40.0),
    ("algebra", 45.0),
    ("geometry", 50.0),
    ("word_problems", 60.0),
];

pub const STARTING_RATING: i32 = 50;
const INCORRECT_PENALTY: i32 = 5;

pub const DEFAULT_BASELINE_MS: f64 = 30_000.0;
const FIRST_NUDGE_FACTOR: f64 = 1.25;
const SECOND_NUDGE_FACTOR: f64 = 1.75;
const FIRST_NUDGE_MIN_MS: f64 = 6_000.0;
const FIRST_NUDGE_MAX_MS: f64 = 90_000.0;
/// Minimum gap between the first and second nudge.
pub const NUDGE_GAP_MS: f64 = 6_000.0;
const SECOND_NUDGE_MAX_MS: f64 = 150_000.0;

/// Tunable target times. The defaults reproduce the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Target for topics with no override and no built-in entry.
    #[serde(default = "default_target_secs")]
    pub default_target_secs: f64,
    /// Per-topic overrides, consulted before the built-in table.
    #[serde(default)]
    pub topic_targets: HashMap<String, f64>,
}

fn default_target_secs() -> f64 {
    DEFAULT_TARGET_SECS
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            default_target_secs: DEFAULT_TARGET_SECS,
            topic_targets: HashMap::new(),
        }
    }
}

impl FocusConfig {
    pub fn target_seconds(&self, topic: &str) -> f64 {
        let topic = topic.trim().to_lowercase();
        if let Some(&secs) = self.topic_targets.get(&topic) {
            return secs;
        }
        TOPIC_TARGET_SECS
            .iter()
            .find(|(name, _)| *name == topic)
            .map(|&(_, secs)| secs)
            .unwrap_or(self.default_target_secs)
    }

    /// `target / max(1, seconds)`, clamped to `[0.25, 1.5]`.
    pub fn speed_factor(&self, topic: &str, seconds: f64) -> f64 {
        (self.target_seconds(topic) / seconds.max(1.0)).clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
    }

    /// Fold attempts in the order given. Order matters: this models a streak.
    pub fn efficiency_rating(&self, attempts: &[TimedAttempt]) -> i32 {
        attempts
            .iter()
            .fold(EfficiencyState::new(), |state, attempt| {
                state.apply(attempt, self.speed_factor(&attempt.topic, attempt.seconds()))
            })
            .rating
    }

    pub fn focus_scores(&self, attempts: &[TimedAttempt]) -> FocusScores {
        let total = attempts.len();
        let correct: Vec<&TimedAttempt> = attempts.iter().filter(|a| a.is_correct).collect();

        let accuracy = if total == 0 {
            0
        } else {
            (100.0 * correct.len() as f64 / total as f64).round() as u32
        };

        if correct.is_empty() {
            return FocusScores {
                accuracy,
                speed: 0,
                avg_time_seconds: None,
                total_attempts: total,
                correct_attempts: 0,
            };
        }

        let n = correct.len() as f64;
        let avg_factor = correct
            .iter()
            .map(|a| self.speed_factor(&a.topic, a.seconds()))
            .sum::<f64>()
            / n;
        let speed = ((avg_factor - MIN_SPEED_FACTOR) / (MAX_SPEED_FACTOR - MIN_SPEED_FACTOR)
            * 100.0)
            .clamp(0.0, 100.0)
            .round() as u32;
        let avg_time = correct.iter().map(|a| a.seconds()).sum::<f64>() / n;

        FocusScores {
            accuracy,
            speed,
            avg_time_seconds: Some(avg_time),
            total_attempts: total,
            correct_attempts: correct.len(),
        }
    }
}

impl EfficiencyState {
    pub fn new() -> Self {
        Self {
            rating: STARTING_RATING,
        }
    }

    /// One step of the rating recurrence, clamped to `[0, 100]`.
    pub fn apply(self, attempt: &TimedAttempt, speed_factor: f64) -> Self {
        let delta = if attempt.is_correct {
            (2.0 + 4.0 * speed_factor).round() as i32
        } else {
            -INCORRECT_PENALTY
        };
        let nudges = i32::try_from(attempt.nudges).unwrap_or(i32::MAX);
        Self {
            rating: self
                .rating
                .saturating_add(delta)
                .saturating_sub(nudges)
                .clamp(0, 100),
        }
    }
}

impl Default for EfficiencyState {
    fn default() -> Self {
        Self::new()
    }
}

/// Speed factor for a topic using the built-in target table.
pub fn compute_speed_factor(topic: &str, seconds: f64) -> f64 {
    FocusConfig::default().speed_factor(topic, seconds)
}

/// Rolling efficiency rating; 50 for an empty series.
pub fn compute_efficiency_rating(attempts: &[TimedAttempt]) -> i32 {
    FocusConfig::default().efficiency_rating(attempts)
}

/// Accuracy and speed display scores.
pub fn compute_focus_scores(attempts: &[TimedAttempt]) -> FocusScores {
    FocusConfig::default().focus_scores(attempts)
}

fn median(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    })
}

/// Nudge timing from the median of recent attempt durations.
pub fn compute_adaptive_thresholds(recent_durations_ms: &[u64]) -> NudgeThresholds {
    let baseline = median(recent_durations_ms).unwrap_or(DEFAULT_BASELINE_MS);
    let first = (baseline * FIRST_NUDGE_FACTOR).clamp(FIRST_NUDGE_MIN_MS, FIRST_NUDGE_MAX_MS);
    let second = (baseline * SECOND_NUDGE_FACTOR).clamp(first + NUDGE_GAP_MS, SECOND_NUDGE_MAX_MS);

    NudgeThresholds {
        first_nudge_ms: first.round() as u64,
        second_nudge_ms: second.round() as u64,
        baseline_ms: baseline.round() as u64,
    }
}
