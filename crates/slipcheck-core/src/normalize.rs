//! Answer canonicalization for equality checks.

/// Lowercase and drop every whitespace character.
///
/// Only used to compare answers, never for display. This is deliberately not
/// a numeric equivalence: `"0.5"` and `"1/2"` stay different.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `true` when two answers are the same modulo case and whitespace.
pub fn same_answer(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inner_and_outer_whitespace() {
        assert_eq!(normalize("  3 / 4 "), "3/4");
        assert_eq!(normalize("\t-1 2\n"), "-12");
    }

    #[test]
    fn folds_case() {
        assert_eq!(normalize("X = 5"), "x=5");
        assert!(same_answer("Ab", "aB"));
    }

    #[test]
    fn no_numeric_equivalence() {
        assert!(!same_answer("0.5", "1/2"));
        assert!(!same_answer("05", "5"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize("   "), "");
        assert!(same_answer("", " "));
    }
}
