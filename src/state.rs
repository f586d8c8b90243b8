//! # State Vector
//!
//! A [`State`] is the assignment being simulated: one value index per decoded
//! variable, in variable order. Preconditions and effects are both expressed
//! as lists of [`Fact`]s, `(variable, value)` pairs over the same indices.
//!
//! The decoder guarantees that an initial state has exactly one entry per
//! variable and that every entry is within that variable's domain. Applying
//! an operator only writes values the decoder has already range-checked, so
//! the invariant is preserved for the whole run.
//!
//! ```
//! use sas_sim::{Fact, State};
//!
//! let mut state = State::new(vec![0, 1, 0]);
//! assert!(state.satisfies(&[Fact::new(1, 1)]));
//!
//! state.apply_effects(&[Fact::new(0, 1), Fact::new(2, 1)]);
//! assert_eq!(state.values(), &[1, 1, 1]);
//! ```

use std::fmt;

/// A `(variable, value)` pair used for preconditions and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub var: usize,
    pub value: usize,
}

impl Fact {
    pub fn new(var: usize, value: usize) -> Self {
        Self { var, value }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}={}", self.var, self.value)
    }
}

/// The mutable assignment of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct State {
    values: Vec<usize>,
}

impl State {
    pub fn new(values: Vec<usize>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, var: usize) -> Option<usize> {
        self.values.get(var).copied()
    }

    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// True iff every fact holds. An out-of-range variable never holds.
    pub fn satisfies(&self, facts: &[Fact]) -> bool {
        facts
            .iter()
            .all(|fact| self.get(fact.var) == Some(fact.value))
    }

    /// Writes every effect in place; all other variables are left untouched.
    ///
    /// Effects are applied in order, so if two effects target the same
    /// variable the later one wins.
    pub fn apply_effects(&mut self, effects: &[Fact]) {
        for fact in effects {
            if let Some(slot) = self.values.get_mut(fact.var) {
                *slot = fact.value;
            }
        }
    }

    /// Indices of the variables whose values differ from `other`.
    pub fn changed_vars(&self, other: &State) -> Vec<usize> {
        self.values
            .iter()
            .zip(other.values.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect()
    }
}

impl From<Vec<usize>> for State {
    fn from(values: Vec<usize>) -> Self {
        Self::new(values)
    }
}
