//! Rule-based slip classifier.
//!
//! A wrong answer runs through a fixed list of detectors and the first one
//! that fires labels it. When nothing fires the answer is "not a slip" and the
//! caller escalates to the AI judge. Verdict messages are fixed per type and
//! never interpolate either answer.

use std::sync::LazyLock;

use regex::Regex;

use crate::distance::levenshtein;
use crate::format::detect_format_typo;
use crate::model::{SlipType, SlipVerdict};
use crate::normalize::normalize;

static SIGNED_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid signed integer regex"));

// Spellings of the same value ("+5" and "5", "2.50" and "2.5") match here and
// come out as arithmetic slips; the classifier compares text, not values.
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)$").expect("valid numeric regex")
});

/// Longest normalized answer the arithmetic fallback will look at.
const ARITHMETIC_MAX_LEN: usize = 5;
/// Largest edit distance still treated as an arithmetic slip.
const ARITHMETIC_MAX_DISTANCE: usize = 2;

/// Fixed, value-free message for each slip type.
pub fn slip_message(slip_type: SlipType) -> &'static str {
    match slip_type {
        SlipType::FormatTypo => {
            "Check how your answer is written; it can't be read as a number in the expected form."
        }
        SlipType::ExtraDigit => "An extra digit slipped into your answer. Count the digits again.",
        SlipType::MissingDigit => "A digit is missing from your answer. Count the digits again.",
        SlipType::ExtraZero => "There's an extra zero on the end. Check your place value.",
        SlipType::SignSlip => "Check the sign: should your answer be positive or negative?",
        SlipType::DecimalSlip => "Check where the decimal point goes.",
        SlipType::TransposedDigits => {
            "The right digits are there, but two of them swapped places."
        }
        SlipType::ArithmeticSlip => "Very close! Recheck the arithmetic in your last step.",
    }
}

/// Both answers after normalization, plus their digit strings when both are
/// plain signed integers.
struct Operands<'a> {
    student: &'a str,
    correct: &'a str,
    digits: Option<(&'a str, &'a str)>,
}

impl<'a> Operands<'a> {
    fn new(student: &'a str, correct: &'a str) -> Self {
        let digits = (SIGNED_INTEGER.is_match(student) && SIGNED_INTEGER.is_match(correct))
            .then(|| (strip_sign(student), strip_sign(correct)));
        Self {
            student,
            correct,
            digits,
        }
    }
}

fn strip_sign(s: &str) -> &str {
    s.strip_prefix(['+', '-']).unwrap_or(s)
}

type Detector = fn(&Operands<'_>) -> Option<SlipVerdict>;

/// Detection order. First match wins.
const DETECTORS: &[Detector] = &[
    format_typo,
    extra_zero,
    extra_digit,
    missing_digit,
    transposed_digits,
    sign_slip,
    decimal_slip,
    arithmetic_slip,
];

fn verdict(slip_type: SlipType) -> SlipVerdict {
    SlipVerdict::slip(slip_type, slip_message(slip_type))
}

fn format_typo(ops: &Operands<'_>) -> Option<SlipVerdict> {
    detect_format_typo(ops.student, ops.correct)
        .map(|typo| SlipVerdict::slip(SlipType::FormatTypo, typo.message()))
}

fn extra_zero(ops: &Operands<'_>) -> Option<SlipVerdict> {
    ops.digits?;
    let trailing = ops.student.strip_suffix('0')?;
    (trailing == ops.correct).then(|| verdict(SlipType::ExtraZero))
}

fn extra_digit(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let (student, correct) = ops.digits?;
    let fires = student.len() == correct.len() + 1
        && (student.starts_with(correct) || student.ends_with(correct));
    fires.then(|| verdict(SlipType::ExtraDigit))
}

fn missing_digit(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let (student, correct) = ops.digits?;
    let fires = correct.len() == student.len() + 1
        && (correct.starts_with(student) || correct.ends_with(student));
    fires.then(|| verdict(SlipType::MissingDigit))
}

fn transposed_digits(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let (student, correct) = ops.digits?;
    if student.len() != correct.len() || student.len() < 2 || student == correct {
        return None;
    }
    let mut a: Vec<char> = student.chars().collect();
    let mut b: Vec<char> = correct.chars().collect();
    a.sort_unstable();
    b.sort_unstable();
    (a == b).then(|| verdict(SlipType::TransposedDigits))
}

fn sign_slip(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let fires = ops.student.strip_prefix('-') == Some(ops.correct)
        || ops.correct.strip_prefix('-') == Some(ops.student);
    fires.then(|| verdict(SlipType::SignSlip))
}

fn decimal_slip(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let fires = ops.student.replace('.', "") == ops.correct
        || ops.correct.replace('.', "") == ops.student;
    fires.then(|| verdict(SlipType::DecimalSlip))
}

fn arithmetic_slip(ops: &Operands<'_>) -> Option<SlipVerdict> {
    let fires = NUMERIC.is_match(ops.student)
        && NUMERIC.is_match(ops.correct)
        && ops.student.chars().count() <= ARITHMETIC_MAX_LEN
        && ops.correct.chars().count() <= ARITHMETIC_MAX_LEN
        && levenshtein(ops.student, ops.correct) <= ARITHMETIC_MAX_DISTANCE;
    fires.then(|| verdict(SlipType::ArithmeticSlip))
}

/// Run the detector list on two answers already known to differ.
///
/// Total: returns [`SlipVerdict::not_slip`] when no detector matches.
pub fn detect_review_error(student: &str, correct: &str) -> SlipVerdict {
    let student = normalize(student);
    let correct = normalize(correct);
    let ops = Operands::new(&student, &correct);

    DETECTORS
        .iter()
        .find_map(|detect| detect(&ops))
        .unwrap_or_else(SlipVerdict::not_slip)
}

/// Classify a student answer against the key.
///
/// Answers equal after normalization are never slips.
pub fn classify_answer(student: &str, correct: &str) -> SlipVerdict {
    if normalize(student) == normalize(correct) {
        return SlipVerdict::not_slip();
    }
    let verdict = detect_review_error(student, correct);
    tracing::debug!(
        slip_type = ?verdict.slip_type,
        "classified answer"
    );
    verdict
}
