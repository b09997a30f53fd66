//! Deterministic difficulty-grouped session ordering.
//!
//! Questions are grouped by difficulty, groups run easiest first, and each
//! group is shuffled with a seeded linear-congruential generator. The same
//! questions and seed always produce the same order.

use std::collections::BTreeMap;

use crate::model::Question;

/// Difficulty assumed for questions that don't declare one.
pub const DEFAULT_DIFFICULTY: u8 = 5;

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const LCG_MODULUS: u64 = 1 << 31;

/// `seed = (seed * 1103515245 + 12345) mod 2^31`, scaled by `2^31 - 1`.
///
/// Owned by a single ordering call; there is no shared generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed),
        }
    }

    /// Next value in `[0, 1]`. The upper bound is reachable only when the
    /// state lands on `2^31 - 1`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / (LCG_MODULUS - 1) as f64
    }
}

/// In-place Fisher–Yates shuffle driven by `rng`.
pub fn seeded_shuffle<T>(items: &mut [T], rng: &mut Lcg) {
    for i in (1..items.len()).rev() {
        let j = ((rng.next_f64() * (i + 1) as f64).floor() as usize).min(i);
        items.swap(i, j);
    }
}

/// Question ids grouped by difficulty, keys ascending.
pub fn group_by_difficulty(questions: &[Question]) -> BTreeMap<u8, Vec<&str>> {
    let mut groups: BTreeMap<u8, Vec<&str>> = BTreeMap::new();
    for q in questions {
        groups
            .entry(q.difficulty.unwrap_or(DEFAULT_DIFFICULTY))
            .or_default()
            .push(q.id.as_str());
    }
    groups
}

/// Order questions easiest group first, shuffling inside each group.
///
/// One generator runs across all groups in ascending difficulty order.
pub fn order_by_difficulty(questions: &[Question], seed: u32) -> Vec<String> {
    let mut rng = Lcg::new(seed);
    let mut ordered = Vec::with_capacity(questions.len());

    for (difficulty, mut ids) in group_by_difficulty(questions) {
        seeded_shuffle(&mut ids, &mut rng);
        tracing::trace!(difficulty, count = ids.len(), "ordered difficulty group");
        ordered.extend(ids.into_iter().map(str::to_string));
    }

    ordered
}
