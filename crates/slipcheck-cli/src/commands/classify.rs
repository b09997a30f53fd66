//! The `slipcheck classify` command.

use anyhow::Result;
use serde::Serialize;

use slipcheck_core::build_coach_note;
use slipcheck_core::engine::{assess_locally, LocalAssessment};
use slipcheck_core::model::{Attempt, CoachNote, ErrorClass, SlipVerdict};

use crate::OutputFormat;

#[derive(Serialize)]
struct ClassifyOutput {
    /// `correct`, `review_error` or `escalate`.
    result: &'static str,
    slip: SlipVerdict,
    coach_note: CoachNote,
}

pub fn execute(
    student: String,
    correct: String,
    explanation: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    anyhow::ensure!(!correct.trim().is_empty(), "--correct must not be empty");

    let attempt = Attempt {
        question_prompt: String::new(),
        correct_answer: correct,
        student_answer: student,
        student_explanation: explanation,
        thinking_log: vec![],
    };

    let (result, slip, is_correct, error_class) = match assess_locally(&attempt) {
        LocalAssessment::Correct => ("correct", SlipVerdict::not_slip(), true, None),
        LocalAssessment::Slip(verdict) => {
            ("review_error", verdict, false, Some(ErrorClass::ReviewError))
        }
        // Without a judge an unexplained miss is coached as a misconception.
        LocalAssessment::Escalate => ("escalate", SlipVerdict::not_slip(), false, None),
    };

    let coach_note = build_coach_note(
        attempt.student_explanation.as_deref(),
        &attempt.thinking_log,
        is_correct,
        error_class,
        slip.slip_type,
    );

    let output = ClassifyOutput {
        result,
        slip,
        coach_note,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text | OutputFormat::Markdown => print_text(&output),
    }

    Ok(())
}

fn print_text(output: &ClassifyOutput) {
    println!("Result: {}", output.result);
    if let Some(slip_type) = output.slip.slip_type {
        println!("Slip: {slip_type}");
    }
    if let Some(message) = &output.slip.message {
        println!("Message: {message}");
    }

    let note = &output.coach_note;
    println!();
    println!("{}", note.title);
    for line in &note.what_went_well {
        println!("  + {line}");
    }
    for line in &note.what_to_fix {
        println!("  - {line}");
    }
    println!("Remember: {}", note.remember);
    println!("Next: {}", note.next_step);
}
