//! Answer shape checks: integers, fractions, and format typos.
//!
//! The expected shape always comes from the answer key. A format typo is an
//! answer that cannot be read as a number of that shape at all, which is
//! reported before any digit-level analysis.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+-]?[0-9]+\s*$").expect("valid integer regex"));

static FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?[0-9]+)/([+-]?[0-9]+)\s*$").expect("valid fraction regex")
});

/// Optional sign, digits, surrounding whitespace.
pub fn is_integer_shaped(s: &str) -> bool {
    INTEGER.is_match(s)
}

/// Optional sign, digits, `/`, optional sign, digits, surrounding whitespace.
pub fn is_fraction_shaped(s: &str) -> bool {
    FRACTION.is_match(s)
}

/// A parsed fraction. The denominator is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

/// Parse `a/b` into integers. `None` for non-numeric parts, overflow, or a
/// zero denominator.
pub fn parse_fraction(s: &str) -> Option<Fraction> {
    let caps = FRACTION.captures(s)?;
    let numerator = caps[1].parse::<i64>().ok()?;
    let denominator = caps[2].parse::<i64>().ok()?;
    if denominator == 0 {
        return None;
    }
    Some(Fraction {
        numerator,
        denominator,
    })
}

/// The numeric shape an answer key has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedShape {
    Integer,
    Fraction,
}

impl ExpectedShape {
    /// `None` for keys that are neither (decimals, expressions, words).
    pub fn of(correct: &str) -> Option<Self> {
        if is_fraction_shaped(correct) {
            Some(ExpectedShape::Fraction)
        } else if is_integer_shaped(correct) {
            Some(ExpectedShape::Integer)
        } else {
            None
        }
    }

    /// Whether `student` is an acceptable way to write an answer of this shape.
    fn accepts(self, student: &str) -> bool {
        match self {
            // An integer is a valid simplification of a fraction answer.
            ExpectedShape::Fraction => is_fraction_shaped(student) || is_integer_shaped(student),
            // A well-formed fraction is an equivalent-fraction answer, not a typo.
            ExpectedShape::Integer => {
                is_integer_shaped(student) || parse_fraction(student).is_some()
            }
        }
    }

    fn allows_char(self, c: char) -> bool {
        let base = c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '.');
        match self {
            ExpectedShape::Fraction => base || c == '/',
            ExpectedShape::Integer => base,
        }
    }
}

/// The ways an answer can be malformed, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTypo {
    /// Leading, trailing, or doubled slash.
    SlashPlacement,
    /// A slash is present but the answer is not a fraction.
    IncompleteFraction,
    /// Characters that have no place in a number of the expected shape.
    UnexpectedCharacters,
}

impl FormatTypo {
    pub fn message(self) -> &'static str {
        match self {
            FormatTypo::SlashPlacement => {
                "Check the fraction bar: a slash is missing a number on one side or appears twice."
            }
            FormatTypo::IncompleteFraction => {
                "That isn't a complete fraction. Write it as one whole number over another."
            }
            FormatTypo::UnexpectedCharacters => {
                "Your answer has characters that don't belong in a number. Check what you typed."
            }
        }
    }
}

/// Flag answers that can't be read as a number of the expected shape.
pub fn detect_format_typo(student: &str, correct: &str) -> Option<FormatTypo> {
    let shape = ExpectedShape::of(correct)?;
    if shape.accepts(student) {
        return None;
    }

    let trimmed = student.trim();
    if trimmed.starts_with('/') || trimmed.ends_with('/') || trimmed.contains("//") {
        return Some(FormatTypo::SlashPlacement);
    }
    if trimmed.contains('/') {
        return Some(FormatTypo::IncompleteFraction);
    }
    if trimmed.chars().any(|c| !shape.allows_char(c)) {
        return Some(FormatTypo::UnexpectedCharacters);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_shape() {
        assert!(is_integer_shaped("42"));
        assert!(is_integer_shaped(" -7 "));
        assert!(is_integer_shaped("+3"));
        assert!(!is_integer_shaped("3.5"));
        assert!(!is_integer_shaped("--3"));
        assert!(!is_integer_shaped(""));
    }

    #[test]
    fn only_ascii_digits_have_a_shape() {
        assert!(!is_integer_shaped("\u{663}"));
        assert!(!is_fraction_shaped("\u{663}/4"));
        assert_eq!(
            detect_format_typo("\u{663}", "3"),
            Some(FormatTypo::UnexpectedCharacters)
        );
    }

    #[test]
    fn fraction_shape() {
        assert!(is_fraction_shaped("3/4"));
        assert!(is_fraction_shaped(" -3/-4 "));
        assert!(!is_fraction_shaped("3/"));
        assert!(!is_fraction_shaped("/4"));
        assert!(!is_fraction_shaped("3//4"));
        assert!(!is_fraction_shaped("1.5/2"));
    }

    #[test]
    fn parse_fraction_values() {
        assert_eq!(
            parse_fraction("-6/8"),
            Some(Fraction {
                numerator: -6,
                denominator: 8
            })
        );
        assert_eq!(parse_fraction("3/0"), None);
        assert_eq!(parse_fraction("a/4"), None);
        assert_eq!(parse_fraction("99999999999999999999/2"), None);
    }

    #[test]
    fn expected_shape_from_key() {
        assert_eq!(ExpectedShape::of("3/4"), Some(ExpectedShape::Fraction));
        assert_eq!(ExpectedShape::of("12"), Some(ExpectedShape::Integer));
        assert_eq!(ExpectedShape::of("2.5"), None);
        assert_eq!(ExpectedShape::of("x+1"), None);
    }

    #[test]
    fn slash_placement_typos() {
        assert_eq!(
            detect_format_typo("3/", "3/4"),
            Some(FormatTypo::SlashPlacement)
        );
        assert_eq!(
            detect_format_typo("/4", "3/4"),
            Some(FormatTypo::SlashPlacement)
        );
        assert_eq!(
            detect_format_typo("3//4", "3/4"),
            Some(FormatTypo::SlashPlacement)
        );
        assert_eq!(
            detect_format_typo("12/", "12"),
            Some(FormatTypo::SlashPlacement)
        );
    }

    #[test]
    fn incomplete_fraction() {
        assert_eq!(
            detect_format_typo("3/4/5", "3/4"),
            Some(FormatTypo::IncompleteFraction)
        );
        assert_eq!(
            detect_format_typo("1.5/2", "3/4"),
            Some(FormatTypo::IncompleteFraction)
        );
    }

    #[test]
    fn unexpected_characters() {
        assert_eq!(
            detect_format_typo("3o", "30"),
            Some(FormatTypo::UnexpectedCharacters)
        );
        assert_eq!(
            detect_format_typo("x=5", "5"),
            Some(FormatTypo::UnexpectedCharacters)
        );
    }

    #[test]
    fn acceptable_alternates_are_not_typos() {
        // Integer for a fraction key.
        assert_eq!(detect_format_typo("1", "2/2"), None);
        // Equivalent fraction for an integer key.
        assert_eq!(detect_format_typo("4/2", "2"), None);
        // Ordinary wrong answer of the right shape.
        assert_eq!(detect_format_typo("5/8", "3/4"), None);
    }

    #[test]
    fn decimals_are_left_to_slip_checks() {
        assert_eq!(detect_format_typo("3.5", "35"), None);
    }

    #[test]
    fn unshaped_key_never_flags() {
        assert_eq!(detect_format_typo("abc", "2.5"), None);
    }
}
