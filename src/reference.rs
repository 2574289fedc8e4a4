//! # Reference Sequences
//!
//! Checks an automaton against known integer sequences. Reading a row as a
//! binary number, with the rightmost live cell as bit 0, turns the evolution
//! of a single seed into an integer sequence. For rule 190 that sequence obeys
//! `a(t) = 4a(t-1) + a(t-2) - 4a(t-3)` with `a(0..3) = 1, 7, 29`.
//!
//! Verification runs on a fixed-zero row wide enough that the light cone of
//! the seed never reaches an edge.
//!
//! ## Example
//! ```rust
//! use eca_midi::reference::{rule190_sequence, verify_single_seed};
//! use eca_midi::RuleTable;
//!
//! let expected = rule190_sequence(8);
//! assert_eq!(expected, vec![1, 7, 29, 119, 477, 1911, 7645, 30583]);
//! assert!(verify_single_seed(RuleTable::from(190), &expected).is_empty());
//! ```

use crate::automaton::{AutomatonEngine, Boundary};
use crate::rule::RuleTable;

/// Read a row as an integer, anchoring the rightmost live cell at bit 0.
///
/// Returns `Some(0)` for an empty row and `None` if the live span is wider
/// than 128 cells.
pub fn row_to_int_anchored(row: &[u8]) -> Option<u128> {
    let Some(rightmost) = row.iter().rposition(|&c| c == 1) else {
        return Some(0);
    };

    let mut value: u128 = 0;
    for (bit, &cell) in row[..=rightmost].iter().rev().enumerate() {
        if cell == 1 {
            if bit >= 128 {
                return None;
            }
            value |= 1u128 << bit;
        }
    }
    Some(value)
}

/// First `n` terms of the rule 190 single-seed sequence.
///
/// Stops early if a term no longer fits in a `u128`.
pub fn rule190_sequence(n: usize) -> Vec<u128> {
    let mut terms: Vec<u128> = [1u128, 7, 29].into_iter().take(n).collect();
    while terms.len() < n {
        let k = terms.len();
        let next = terms[k - 1]
            .checked_mul(4)
            .and_then(|v| v.checked_add(terms[k - 2]))
            .and_then(|v| v.checked_sub(4 * terms[k - 3]));
        match next {
            Some(v) => terms.push(v),
            None => break,
        }
    }
    terms
}

/// A step where the automaton disagreed with the expected sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceMismatch {
    pub step: usize,
    pub expected: u128,
    /// `None` when the row was too wide to read as an integer.
    pub actual: Option<u128>,
}

/// Run a single seed under `rule` for `expected.len()` rows and collect every
/// row that does not read as the expected integer.
pub fn verify_single_seed(rule: RuleTable, expected: &[u128]) -> Vec<SequenceMismatch> {
    let n = expected.len();
    let width = 1 + 2 * n;
    let row = AutomatonEngine::single_seed_row(width);
    let Ok(mut engine) = AutomatonEngine::with_boundary(width, rule, row, Boundary::FixedZero) else {
        return Vec::new();
    };

    let mut mismatches = Vec::new();
    for (step, &want) in expected.iter().enumerate() {
        let actual = row_to_int_anchored(engine.row());
        if actual != Some(want) {
            mismatches.push(SequenceMismatch {
                step,
                expected: want,
                actual,
            });
        }
        engine.step();
    }
    mismatches
}
