//! Coach-note generation.
//!
//! Turns an assessment outcome plus the student's own reasoning into a
//! [`CoachNote`]. The note always has every field filled so the UI can render
//! the same layout for every branch.

use crate::model::{CoachNote, ErrorClass, SlipType, ThinkingEntry};

/// Reasoning shorter than this (in characters, trimmed) is treated as absent.
pub const MIN_EXPLANATION_CHARS: usize = 15;
/// Longest student quotation embedded in a note, ellipsis included.
pub const QUOTE_MAX_CHARS: usize = 30;
const ELLIPSIS: &str = "...";

/// A family of phrases that points at a particular misunderstanding.
struct KeywordFamily {
    name: &'static str,
    matches: fn(&str) -> bool,
    fix: &'static str,
    remember: &'static str,
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Checked in order; the first family that matches wins.
const KEYWORD_FAMILIES: &[KeywordFamily] = &[
    KeywordFamily {
        name: "sequencing",
        matches: |t| contains_any(t, &["first", "then", "next", "step", "after that", "finally"]),
        fix: "One of your steps went off track. Check that each step really follows from the one before it.",
        remember: "Check every step before moving on.",
    },
    KeywordFamily {
        name: "reasoning",
        matches: |t| contains_any(t, &["because", "therefore", "since", "so that", "which means"]),
        fix: "The rule behind your reasoning doesn't hold here. Test it on a small, easy example.",
        remember: "Test a rule on an easy case first.",
    },
    KeywordFamily {
        name: "fraction_addition",
        matches: |t| {
            t.contains("add") && contains_any(t, &["numerator", "denominator", "top", "bottom"])
        },
        fix: "When adding fractions you can't add the tops and the bottoms separately. Find a common denominator first.",
        remember: "Common denominator first, then add the numerators.",
    },
    KeywordFamily {
        name: "add_both",
        matches: |t| t.contains("add both"),
        fix: "Adding both numbers isn't always the right move. Reread what the question is asking for.",
        remember: "Pick the operation before you calculate.",
    },
    KeywordFamily {
        name: "multiplication",
        matches: |t| contains_any(t, &["times", "multiply", "multiplied", "product"]),
        fix: "Multiplication doesn't fit this situation the way you used it. Check what is being grouped or scaled.",
        remember: "Multiplying means equal groups; check that fits.",
    },
    KeywordFamily {
        name: "sign",
        matches: |t| contains_any(t, &["negative", "minus", "positive", "sign"]),
        fix: "The signs got mixed up along the way. Track each negative through every step.",
        remember: "Carry the sign with its number every step.",
    },
    KeywordFamily {
        name: "equality",
        matches: |t| contains_any(t, &["same", "equal"]),
        fix: "Two things that look alike aren't always equal. Compare their actual values.",
        remember: "Equal means the same value, not the same look.",
    },
];

fn family_matches(name: &str, text: &str) -> bool {
    KEYWORD_FAMILIES
        .iter()
        .any(|family| family.name == name && (family.matches)(text))
}

const GENERIC_FIX: &str =
    "There's a gap in the method. Compare your steps with a worked example of this kind of problem.";
const GENERIC_REMEMBER: &str = "Explain why each step works, not just what you did.";

/// Remediation tip for a slip, from a closed table.
pub fn slip_tip(slip_type: Option<SlipType>) -> &'static str {
    let Some(slip_type) = slip_type else {
        return "Your method works. Double-check the final answer before you submit it.";
    };
    match slip_type {
        SlipType::FormatTypo => "Check how you wrote the answer: one number, or one number over another.",
        SlipType::ExtraDigit => "Count the digits in your answer against your working.",
        SlipType::MissingDigit => "Copy every digit from your working into the answer box.",
        SlipType::ExtraZero => "Check the place value of your last digit; a stray zero multiplies by ten.",
        SlipType::SignSlip => "Decide whether the answer should be positive or negative before writing it.",
        SlipType::DecimalSlip => "Estimate the size of the answer first to place the decimal point.",
        SlipType::TransposedDigits => "Read your digits back one at a time against your working.",
        SlipType::ArithmeticSlip => "Redo the last calculation slowly, or check it with the inverse operation.",
    }
}

/// The student's reasoning as one narrative.
///
/// A non-empty thinking log wins over the free-text explanation; each entry
/// is prefixed with its kind label and entries are joined by newlines.
pub fn combined_reasoning(explanation: Option<&str>, thinking_log: &[ThinkingEntry]) -> String {
    if thinking_log.is_empty() {
        return explanation.unwrap_or_default().trim().to_string();
    }
    thinking_log
        .iter()
        .map(|entry| format!("{}: {}", entry.kind.label(), entry.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The text the note analyses, plus what can be quoted back to the student.
struct Reasoning {
    /// Labelled narrative, case-folded, used for keyword scanning.
    folded: String,
    /// Length of the labelled narrative in chars.
    narrative_chars: usize,
    /// The student's own words without labels.
    words: String,
    entries: usize,
}

impl Reasoning {
    fn gather(explanation: Option<&str>, thinking_log: &[ThinkingEntry]) -> Self {
        if thinking_log.is_empty() {
            let words = explanation.unwrap_or_default().trim().to_string();
            return Self {
                folded: words.to_lowercase(),
                narrative_chars: words.chars().count(),
                words,
                entries: 0,
            };
        }

        let narrative = combined_reasoning(explanation, thinking_log);
        let words = thinking_log
            .iter()
            .map(|entry| entry.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            folded: narrative.to_lowercase(),
            narrative_chars: narrative.trim().chars().count(),
            words,
            entries: thinking_log.len(),
        }
    }

    fn is_meaningful(&self) -> bool {
        self.narrative_chars >= MIN_EXPLANATION_CHARS
    }

    fn quote(&self) -> String {
        quote(&self.words)
    }
}

/// Quote the student's words, ellipsized to [`QUOTE_MAX_CHARS`].
pub fn quote(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= QUOTE_MAX_CHARS {
        return text;
    }
    let keep = QUOTE_MAX_CHARS - ELLIPSIS.len();
    let head: String = text.chars().take(keep).collect();
    format!("{}{ELLIPSIS}", head.trim_end())
}

/// Build the coach note for one attempt.
///
/// A non-empty `thinking_log` supersedes `explanation`. `error_class` is only
/// consulted when the answer is wrong; a wrong answer with no class is treated
/// as a misconception.
pub fn build_coach_note(
    explanation: Option<&str>,
    thinking_log: &[ThinkingEntry],
    is_correct: bool,
    error_class: Option<ErrorClass>,
    slip_type: Option<SlipType>,
) -> CoachNote {
    let reasoning = Reasoning::gather(explanation, thinking_log);
    if !reasoning.is_meaningful() {
        return too_short_note();
    }

    if is_correct {
        return correct_note(&reasoning);
    }
    match error_class {
        Some(ErrorClass::ReviewError) => review_note(&reasoning, slip_type),
        Some(ErrorClass::Misconception) | None => misconception_note(&reasoning),
    }
}

fn too_short_note() -> CoachNote {
    CoachNote {
        title: "Tell me more next time".into(),
        what_went_well: vec![],
        what_to_fix: vec![],
        remember: "A full sentence about your thinking helps most.".into(),
        next_step: "Next time, write a sentence or two about how you solved it.".into(),
    }
}

fn correct_note(reasoning: &Reasoning) -> CoachNote {
    let mut well = vec![format!(
        "You explained your thinking clearly: \"{}\"",
        reasoning.quote()
    )];
    if reasoning.entries > 1 {
        well.push("You kept refining your idea across the follow-up questions.".into());
    }
    well.push(if family_matches("reasoning", &reasoning.folded) {
        "You backed each step with a reason.".into()
    } else {
        "You reached the right answer and showed how you got there.".into()
    });
    well.truncate(2);

    CoachNote {
        title: "Nice work!".into(),
        what_went_well: well,
        what_to_fix: vec![],
        remember: "Keep explaining your steps; it locks in the idea.".into(),
        next_step: "Try a harder problem on this topic.".into(),
    }
}

fn review_note(reasoning: &Reasoning, slip_type: Option<SlipType>) -> CoachNote {
    CoachNote {
        title: "So close: just a slip".into(),
        what_went_well: vec![format!(
            "Your approach was on track: \"{}\"",
            reasoning.quote()
        )],
        what_to_fix: vec![slip_tip(slip_type).into()],
        remember: "Slow down on the final answer.".into(),
        next_step: "Read your answer aloud before submitting.".into(),
    }
}

fn misconception_note(reasoning: &Reasoning) -> CoachNote {
    let family = KEYWORD_FAMILIES
        .iter()
        .find(|family| (family.matches)(&reasoning.folded));
    tracing::debug!(
        family = family.map(|f| f.name).unwrap_or("generic"),
        "selected misconception feedback"
    );
    let (fix, remember) = family
        .map(|f| (f.fix, f.remember))
        .unwrap_or((GENERIC_FIX, GENERIC_REMEMBER));

    CoachNote {
        title: "Let's fix the idea".into(),
        what_went_well: vec![format!(
            "Thanks for sharing your reasoning: \"{}\"",
            reasoning.quote()
        )],
        what_to_fix: vec![fix.into()],
        remember: remember.into(),
        next_step: "Try a similar problem and explain each step as you go.".into(),
    }
}
