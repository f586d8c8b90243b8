//! # Grounded Operators
//!
//! A grounded operator is a fully instantiated action: a name made of a head
//! token and argument tokens, a set of preconditions and a set of effects over
//! the indexed state variables.
//!
//! Each operator is classified once, when it is decoded, as either a
//! [`OperatorKind::Player`] action (a deliberate agent choice) or a
//! [`OperatorKind::Forced`] action (an automatic environment reaction such as
//! gravity). The tag travels with the operator so that no caller needs to
//! re-inspect name prefixes.
//!
//! ## Basic Usage
//!
//! ```
//! use sas_sim::{Fact, Operator, OperatorKind, OperatorName, State};
//!
//! let step = Operator::new(
//!     OperatorName::new("move", ["agent", "c_1_1", "c_1_2"]),
//!     OperatorKind::Player,
//!     vec![Fact::new(0, 0)],
//!     vec![Fact::new(0, 1)],
//! );
//!
//! let mut state = State::new(vec![0, 3]);
//! assert!(step.is_applicable(&state));
//! step.apply(&mut state);
//! assert_eq!(state.values(), &[1, 3]);
//! assert!(!step.is_applicable(&state));
//! ```

use std::fmt;

use crate::grid::Cell;
use crate::{Fact, State};

/// Lookup key: lowercased head plus lowercased arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorKey {
    pub head: String,
    pub args: Vec<String>,
}

impl OperatorKey {
    pub fn new<S: AsRef<str>>(head: &str, args: &[S]) -> Self {
        Self {
            head: head.to_ascii_lowercase(),
            args: args.iter().map(|a| a.as_ref().to_ascii_lowercase()).collect(),
        }
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Head token plus ordered argument tokens, as written by the producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorName {
    pub head: String,
    pub args: Vec<String>,
}

impl OperatorName {
    pub fn new<I, S>(head: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            head: head.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key(&self) -> OperatorKey {
        OperatorKey::new(&self.head, &self.args)
    }

    /// Lowercased `head arg1 arg2 ...`, the ordering used by forced closure.
    pub fn canonical(&self) -> String {
        self.key().to_string()
    }

    /// Returns a copy with every token lowercased.
    pub fn to_lowercase(&self) -> OperatorName {
        let key = self.key();
        OperatorName {
            head: key.head,
            args: key.args,
        }
    }
}

impl fmt::Display for OperatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.head)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        f.write_str(")")
    }
}

/// Who triggers an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Player,
    Forced,
}

/// A grounded operator from the decoded task.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: OperatorName,
    pub kind: OperatorKind,
    /// Prevail conditions plus conditions folded in from effects
    pub preconditions: Vec<Fact>,
    pub effects: Vec<Fact>,
    pub cost: i64,
}

impl Operator {
    pub fn new(
        name: OperatorName,
        kind: OperatorKind,
        preconditions: Vec<Fact>,
        effects: Vec<Fact>,
    ) -> Self {
        Self {
            name,
            kind,
            preconditions,
            effects,
            cost: 1,
        }
    }

    pub fn is_forced(&self) -> bool {
        self.kind == OperatorKind::Forced
    }

    pub fn key(&self) -> OperatorKey {
        self.name.key()
    }

    /// True iff every precondition holds in `state`.
    pub fn is_applicable(&self, state: &State) -> bool {
        state.satisfies(&self.preconditions)
    }

    /// Applies the effects in place. Applicability is not checked here.
    pub fn apply(&self, state: &mut State) {
        state.apply_effects(&self.effects);
    }

    /// Returns a new state with the effects applied, leaving `state` intact.
    pub fn applied(&self, state: &State) -> State {
        let mut next = state.clone();
        self.apply(&mut next);
        next
    }

    /// Source and destination cells of a `head actor <from> <to> ...` name.
    pub fn endpoints(&self) -> Option<(Cell, Cell)> {
        let from = Cell::parse(self.name.args.get(1)?)?;
        let to = Cell::parse(self.name.args.get(2)?)?;
        Some((from, to))
    }

    pub(crate) fn executed(&self) -> ExecutedAction {
        ExecutedAction {
            name: self.name.to_lowercase(),
            kind: self.kind,
        }
    }
}

/// One entry of a low-level executed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutedAction {
    pub name: OperatorName,
    pub kind: OperatorKind,
}

impl ExecutedAction {
    pub fn is_forced(&self) -> bool {
        self.kind == OperatorKind::Forced
    }
}

impl fmt::Display for ExecutedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_operator(pre: Vec<(usize, usize)>, eff: Vec<(usize, usize)>) -> Operator {
        Operator::new(
            OperatorName::new("Move", ["A", "C_1_1", "c_1_2"]),
            OperatorKind::Player,
            pre.into_iter().map(|(v, x)| Fact::new(v, x)).collect(),
            eff.into_iter().map(|(v, x)| Fact::new(v, x)).collect(),
        )
    }

    #[test]
    fn test_key_is_lowercased() {
        let op = make_operator(vec![], vec![]);
        assert_eq!(op.key(), OperatorKey::new("move", &["a", "c_1_1", "c_1_2"]));
        assert_eq!(op.name.canonical(), "move a c_1_1 c_1_2");
    }

    #[test]
    fn test_display_keeps_case() {
        let op = make_operator(vec![], vec![]);
        assert_eq!(op.name.to_string(), "(Move A C_1_1 c_1_2)");
        assert_eq!(OperatorName::new("noop", Vec::<String>::new()).to_string(), "(noop)");
    }

    #[test]
    fn test_applicable_with_empty_preconditions() {
        let op = make_operator(vec![], vec![(0, 1)]);
        assert!(op.is_applicable(&State::new(vec![0])));
    }

    #[test]
    fn test_applicable_with_unmatching_preconditions() {
        let op = make_operator(vec![(0, 1), (1, 0)], vec![]);
        assert!(op.is_applicable(&State::new(vec![1, 0])));
        assert!(!op.is_applicable(&State::new(vec![1, 1])));
    }

    #[test]
    fn test_applied_leaves_input_untouched() {
        let op = make_operator(vec![], vec![(1, 2)]);
        let state = State::new(vec![0, 0, 0]);
        let next = op.applied(&state);
        assert_eq!(state.values(), &[0, 0, 0]);
        assert_eq!(next.values(), &[0, 2, 0]);
        assert_eq!(next.changed_vars(&state), vec![1]);
    }

    #[test]
    fn test_endpoints() {
        let op = make_operator(vec![], vec![]);
        assert_eq!(op.endpoints(), Some((Cell::new(1, 1), Cell::new(1, 2))));

        let fall = Operator::new(
            OperatorName::new("__forced__fall", ["c_1_1"]),
            OperatorKind::Forced,
            vec![],
            vec![],
        );
        assert_eq!(fall.endpoints(), None);
    }

    #[test]
    fn test_executed_is_lowercased() {
        let op = make_operator(vec![], vec![]);
        let executed = op.executed();
        assert_eq!(executed.name.head, "move");
        assert_eq!(executed.name.args, vec!["a", "c_1_1", "c_1_2"]);
        assert!(!executed.is_forced());
    }
}
