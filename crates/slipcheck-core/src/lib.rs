//! Answer assessment and adaptive scoring.
//!
//! This crate holds the deterministic layer that decides whether a wrong
//! answer is a superficial slip or a conceptual error, turns that decision
//! into a coach note, orders practice sessions by difficulty, and scores
//! timed Focus Mode attempts. Everything except [`engine`] is pure.

pub mod classifier;
pub mod coach;
pub mod distance;
pub mod engine;
pub mod error;
pub mod focus;
pub mod format;
pub mod model;
pub mod normalize;
pub mod ordering;
pub mod parser;
pub mod report;
pub mod traits;

pub use classifier::classify_answer;
pub use coach::build_coach_note;
pub use focus::{
    compute_adaptive_thresholds, compute_efficiency_rating, compute_focus_scores,
    compute_speed_factor,
};
pub use ordering::order_by_difficulty;
