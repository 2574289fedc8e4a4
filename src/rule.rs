//! # Rule Table
//!
//! Decodes a Wolfram rule number (0-255) into the 8-entry lookup from a
//! 3-cell neighborhood to the cell's next state.
//!
//! The neighborhood code is `(left << 2) | (center << 1) | right`, so code 0
//! is `000` and code 7 is `111`. Entry `k` of the table is bit `k` of the rule
//! number.
//!
//! ## Example
//! ```rust
//! use eca_midi::RuleTable;
//!
//! let rule = RuleTable::new(190)?;
//! assert_eq!(rule.lookup(0b000), 0);
//! assert_eq!(rule.lookup(0b111), 1);
//! assert!(rule.is_quiescent());
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use crate::error::EcaError;

/// Number of distinct radius-1 binary neighborhoods.
pub const NEIGHBORHOODS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleTable {
    number: u8,
    table: [u8; NEIGHBORHOODS],
}

impl RuleTable {
    /// Build the table for `rule_number`, rejecting anything outside 0..=255.
    pub fn new(rule_number: i64) -> Result<Self, EcaError> {
        let number = u8::try_from(rule_number).map_err(|_| {
            EcaError::config("rule", format!("must be in 0..=255, got {}", rule_number))
        })?;
        Ok(Self::from_number(number))
    }

    /// Infallible constructor for a rule number already known to be in range.
    pub fn from_number(number: u8) -> Self {
        let mut table = [0u8; NEIGHBORHOODS];
        for (k, entry) in table.iter_mut().enumerate() {
            *entry = (number >> k) & 1;
        }
        Self { number, table }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn table(&self) -> &[u8; NEIGHBORHOODS] {
        &self.table
    }

    /// Next state for a neighborhood code in 0..=7.
    #[inline]
    pub fn lookup(&self, neighborhood: u8) -> u8 {
        debug_assert!(neighborhood < NEIGHBORHOODS as u8, "neighborhood code out of range");
        self.table[usize::from(neighborhood & 0b111)]
    }

    /// An all-dead row stays all-dead under a quiescent rule.
    pub fn is_quiescent(&self) -> bool {
        self.table[0] == 0
    }
}

impl From<u8> for RuleTable {
    fn from(number: u8) -> Self {
        Self::from_number(number)
    }
}
