//! TOML practice-set parser.
//!
//! Loads practice sets from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{default_topic, PracticeSet, Question, Submission};

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;

/// Intermediate TOML structure for practice-set files.
#[derive(Debug, Deserialize)]
struct TomlPracticeFile {
    practice_set: TomlPracticeHeader,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    submissions: Vec<Submission>,
}

#[derive(Debug, Deserialize)]
struct TomlPracticeHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    seed: u32,
    #[serde(default = "default_topic")]
    default_topic: String,
}

/// Parse a single TOML file into a `PracticeSet`.
pub fn parse_practice_set(path: &Path) -> Result<PracticeSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read practice set file: {}", path.display()))?;

    parse_practice_set_str(&content, path)
}

/// Parse a TOML string into a `PracticeSet`.
pub fn parse_practice_set_str(content: &str, source_path: &Path) -> Result<PracticeSet> {
    let parsed: TomlPracticeFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.practice_set;
    Ok(PracticeSet {
        id: header.id,
        name: header.name,
        description: header.description,
        seed: header.seed,
        default_topic: header.default_topic,
        questions: parsed.questions,
        submissions: parsed.submissions,
    })
}

/// Recursively load all `.toml` practice-set files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_practice_directory(dir: &Path) -> Result<Vec<PracticeSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_practice_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_practice_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file, or every practice set under a directory.
pub fn load_practice_sets(path: &Path) -> Result<Vec<PracticeSet>> {
    if path.is_dir() {
        load_practice_directory(path)
    } else {
        Ok(vec![parse_practice_set(path)?])
    }
}

/// A warning from practice-set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a practice set for common issues.
pub fn validate_practice_set(set: &PracticeSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in &set.questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &set.questions {
        if let Some(d) = q.difficulty {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) {
                warnings.push(ValidationWarning {
                    question_id: Some(q.id.clone()),
                    message: format!(
                        "difficulty {d} is outside {MIN_DIFFICULTY}-{MAX_DIFFICULTY}"
                    ),
                });
            }
        }
        if q.correct_answer.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "correct_answer is empty".into(),
            });
        }
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "prompt is empty".into(),
            });
        }
    }

    for (index, s) in set.submissions.iter().enumerate() {
        if !seen_ids.contains(s.question_id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(s.question_id.clone()),
                message: format!("submission #{index} references unknown question"),
            });
        }
    }

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "practice set has no questions".into(),
        });
    }

    warnings
}
