//! # Automaton Engine
//!
//! Owns the row of cells and the per-cell age counters, and advances them one
//! step at a time under a [`RuleTable`].
//!
//! ## Stepping
//! Every cell reads the neighborhood of the *previous* row. The next row is
//! assembled in a separate buffer and swapped in whole, so no caller ever sees
//! a half-updated row.
//!
//! ## Ages
//! - Born this step (`0 -> 1`): age 0
//! - Still alive (`1 -> 1`): previous age + 1
//! - Dead (`-> 0`): age 0 (not meaningful for dead cells)
//!
//! ## Boundaries
//! - [`Boundary::Toroidal`] wraps neighbor indices modulo the width (used for music)
//! - [`Boundary::FixedZero`] treats cells past either end as dead (used for validation)
//!
//! ## Example
//! ```rust
//! use eca_midi::{AutomatonEngine, RuleTable};
//!
//! let row = AutomatonEngine::single_seed_row(7);
//! let mut engine = AutomatonEngine::new(7, RuleTable::new(190)?, row)?;
//! engine.step();
//! assert_eq!(engine.row(), &[0, 0, 1, 1, 1, 0, 0]);
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EcaError;
use crate::rule::RuleTable;

/// How neighbor lookups behave at the row ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Boundary {
    /// Index -1 is the last cell and index W is the first.
    #[default]
    Toroidal,
    /// Cells outside the row are permanently dead.
    FixedZero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonEngine {
    rule: RuleTable,
    boundary: Boundary,
    row: Vec<u8>,
    next: Vec<u8>,
    ages: Vec<u32>,
    generation: usize,
}

impl AutomatonEngine {
    /// Toroidal engine over `initial_row`.
    pub fn new(width: usize, rule: RuleTable, initial_row: Vec<u8>) -> Result<Self, EcaError> {
        Self::with_boundary(width, rule, initial_row, Boundary::Toroidal)
    }

    pub fn with_boundary(
        width: usize,
        rule: RuleTable,
        initial_row: Vec<u8>,
        boundary: Boundary,
    ) -> Result<Self, EcaError> {
        if width == 0 {
            return Err(EcaError::config("width", "must be at least 1"));
        }
        if initial_row.len() != width {
            return Err(EcaError::config(
                "initial-row",
                format!("has {} cells but width is {}", initial_row.len(), width),
            ));
        }
        if let Some(i) = initial_row.iter().position(|&c| c > 1) {
            return Err(EcaError::config(
                "initial-row",
                format!("cell {} is {}, expected 0 or 1", i, initial_row[i]),
            ));
        }

        Ok(Self {
            rule,
            boundary,
            next: vec![0; width],
            ages: vec![0; width],
            row: initial_row,
            generation: 0,
        })
    }

    /// A row of `width` dead cells with one live cell at `width / 2`.
    pub fn single_seed_row(width: usize) -> Vec<u8> {
        let mut row = vec![0; width];
        if let Some(center) = row.get_mut(width / 2) {
            *center = 1;
        }
        row
    }

    pub fn width(&self) -> usize {
        self.row.len()
    }

    pub fn rule(&self) -> &RuleTable {
        &self.rule
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Current row (state at [`generation`](Self::generation)).
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn ages(&self) -> &[u32] {
        &self.ages
    }

    /// Consecutive steps cell `i` has been alive.
    ///
    /// # Panics
    /// Panics if `i >= self.width()`.
    pub fn age(&self, i: usize) -> u32 {
        self.ages[i]
    }

    /// Number of steps taken since construction.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn alive_count(&self) -> usize {
        self.row.iter().filter(|&&c| c == 1).count()
    }

    /// Neighborhood code of cell `i` in the current row.
    pub fn neighborhood(&self, i: usize) -> u8 {
        let w = self.row.len();
        let (left, right) = match self.boundary {
            Boundary::Toroidal => (self.row[(i + w - 1) % w], self.row[(i + 1) % w]),
            Boundary::FixedZero => (
                if i > 0 { self.row[i - 1] } else { 0 },
                if i + 1 < w { self.row[i + 1] } else { 0 },
            ),
        };
        (left << 2) | (self.row[i] << 1) | right
    }

    /// Advance one generation and return the new row.
    pub fn step(&mut self) -> &[u8] {
        for i in 0..self.row.len() {
            let code = self.neighborhood(i);
            self.next[i] = self.rule.lookup(code);
        }

        for ((age, &old), &new) in self.ages.iter_mut().zip(&self.row).zip(&self.next) {
            *age = match (old, new) {
                (1, 1) => (*age).saturating_add(1),
                _ => 0,
            };
        }

        std::mem::swap(&mut self.row, &mut self.next);
        self.generation += 1;
        &self.row
    }

    /// Advance `n` generations.
    pub fn steps(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }
}

/// Render a row as text, one glyph per cell.
pub fn render_row(row: &[u8]) -> String {
    row.iter().map(|&c| if c == 1 { '█' } else { '·' }).collect()
}
