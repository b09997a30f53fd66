//! The `slipcheck validate` command.

use std::path::PathBuf;

use anyhow::Result;

use slipcheck_core::parser::{load_practice_sets, validate_practice_set};

pub fn execute(practice_set_path: PathBuf) -> Result<()> {
    let sets = load_practice_sets(&practice_set_path)?;

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Practice set: {} ({} questions, {} submissions)",
            set.name,
            set.questions.len(),
            set.submissions.len()
        );

        let warnings = validate_practice_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All practice sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
