//! # Action Resolver
//!
//! Maps requests onto grounded operators, either by exact name and arguments
//! or by a directional intent evaluated against the current state.
//!
//! The index is built once per task. When two grounded operators share a key
//! only the first is indexed; the later one is invisible to lookup and to
//! forced closure alike.

use std::collections::HashMap;

use crate::grid::Direction;
use crate::operator::{Operator, OperatorKey};
use crate::{Result, SimConfig, SimError, State};

/// Lookup structure over a decoded operator set.
#[derive(Debug, Clone)]
pub struct OperatorIndex<'t> {
    operators: &'t [Operator],
    by_key: HashMap<OperatorKey, usize>,
    by_direction: HashMap<Direction, Vec<usize>>,
    forced: Vec<usize>,
}

impl<'t> OperatorIndex<'t> {
    pub fn new(operators: &'t [Operator], config: &SimConfig) -> Self {
        let mut by_key = HashMap::with_capacity(operators.len());
        let mut by_direction: HashMap<Direction, Vec<usize>> = HashMap::new();
        let mut forced = Vec::new();

        for (idx, op) in operators.iter().enumerate() {
            let key = op.key();
            if by_key.contains_key(&key) {
                log::warn!(
                    "Duplicate grounded operator {}; keeping the first, the duplicate is excluded from lookup and closure",
                    key
                );
                continue;
            }
            by_key.insert(key, idx);

            if op.is_forced() {
                forced.push(idx);
                continue;
            }
            if !config.is_move_head(&op.name.head) {
                continue;
            }
            if let Some(direction) = op
                .endpoints()
                .and_then(|(from, to)| Direction::between(from, to))
            {
                by_direction.entry(direction).or_default().push(idx);
            }
        }

        Self {
            operators,
            by_key,
            by_direction,
            forced,
        }
    }

    pub fn operators(&self) -> &'t [Operator] {
        self.operators
    }

    fn get(&self, idx: usize) -> &'t Operator {
        let operators: &'t [Operator] = self.operators;
        &operators[idx]
    }

    /// Forced operators in decode order, duplicates excluded.
    pub fn forced(&self) -> impl Iterator<Item = &'t Operator> + '_ {
        self.forced.iter().map(move |&idx| self.get(idx))
    }

    /// Exact, case-insensitive lookup by head and arguments.
    pub fn resolve<S: AsRef<str>>(&self, head: &str, args: &[S]) -> Result<&'t Operator> {
        let key = OperatorKey::new(head, args);
        self.by_key
            .get(&key)
            .map(|&idx| self.get(idx))
            .ok_or_else(|| SimError::UnknownOperator(key.to_string()))
    }

    /// The single applicable player move in `direction` from `state`.
    ///
    /// Zero candidates is [`SimError::NoMoveInDirection`]; several candidates
    /// is [`SimError::AmbiguousDirection`] listing all of them. No candidate
    /// is ever chosen silently.
    pub fn resolve_direction(&self, direction: Direction, state: &State) -> Result<&'t Operator> {
        let mut candidates = self
            .by_direction
            .get(&direction)
            .into_iter()
            .flatten()
            .map(|&idx| self.get(idx))
            .filter(|op| op.is_applicable(state));

        let first = candidates
            .next()
            .ok_or(SimError::NoMoveInDirection { direction })?;
        let rest: Vec<&Operator> = candidates.collect();
        if rest.is_empty() {
            return Ok(first);
        }

        let mut names: Vec<String> = std::iter::once(first)
            .chain(rest)
            .map(|op| op.name.canonical())
            .collect();
        names.sort();
        Err(SimError::AmbiguousDirection {
            direction,
            candidates: names,
        })
    }

    /// Every player move indexed under `direction`, applicable or not.
    pub fn moves(&self, direction: Direction) -> impl Iterator<Item = &'t Operator> + '_ {
        self.by_direction
            .get(&direction)
            .into_iter()
            .flatten()
            .map(move |&idx| self.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{OperatorKind, OperatorName};
    use crate::Fact;

    fn op(head: &str, args: &[&str], kind: OperatorKind, pre: Vec<Fact>) -> Operator {
        Operator::new(
            OperatorName::new(head, args.iter().copied()),
            kind,
            pre,
            vec![],
        )
    }

    fn operators() -> Vec<Operator> {
        vec![
            op("move", &["a", "c_1_1", "c_1_2"], OperatorKind::Player, vec![Fact::new(0, 0)]),
            op("move", &["b", "c_1_1", "c_1_2"], OperatorKind::Player, vec![Fact::new(0, 1)]),
            op("move", &["a", "c_1_2", "c_1_1"], OperatorKind::Player, vec![]),
            op("Move", &["b", "c_1_2", "c_1_1"], OperatorKind::Player, vec![]),
            op("push", &["a", "c_1_1", "c_2_1"], OperatorKind::Player, vec![]),
            op("fa_fall", &["s", "c_1_1", "c_2_1"], OperatorKind::Forced, vec![]),
            op("__forced__end-tick", &[], OperatorKind::Forced, vec![]),
        ]
    }

    #[test]
    fn test_resolve_by_key() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let found = index.resolve("MOVE", &["A", "C_1_1", "c_1_2"]).unwrap();
        assert_eq!(found.name.args[0], "a");
    }

    #[test]
    fn test_resolve_unknown() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let err = index.resolve("move", &["x", "y"]).unwrap_err();
        assert!(matches!(err, SimError::UnknownOperator(ref k) if k == "move x y"));
    }

    #[test]
    fn test_resolve_direction_single() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let state = State::new(vec![1]);
        let found = index.resolve_direction(Direction::Right, &state).unwrap();
        assert_eq!(found.name.args[0], "b");
        // pure in (direction, state)
        let again = index.resolve_direction(Direction::Right, &state).unwrap();
        assert!(std::ptr::eq(found, again));
    }

    #[test]
    fn test_resolve_direction_ambiguous() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let err = index
            .resolve_direction(Direction::Left, &State::new(vec![0]))
            .unwrap_err();
        match err {
            SimError::AmbiguousDirection {
                direction,
                candidates,
            } => {
                assert_eq!(direction, Direction::Left);
                assert_eq!(candidates, vec!["move a c_1_2 c_1_1", "move b c_1_2 c_1_1"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_direction_none() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        // push is not a move and forced operators never resolve from intent
        let err = index
            .resolve_direction(Direction::Down, &State::new(vec![0]))
            .unwrap_err();
        assert!(err.is_unknown_operator());
        assert_eq!(index.moves(Direction::Down).count(), 0);
        assert_eq!(index.moves(Direction::Up).count(), 0);
    }

    #[test]
    fn test_forced_in_decode_order() {
        let ops = operators();
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let names: Vec<_> = index.forced().map(|op| op.name.canonical()).collect();
        assert_eq!(names, vec!["fa_fall s c_1_1 c_2_1", "__forced__end-tick"]);
    }

    #[test]
    fn test_duplicate_forced_excluded_from_closure() {
        let mut ops = operators();
        ops.push(op("FA_FALL", &["s", "c_1_1", "c_2_1"], OperatorKind::Forced, vec![Fact::new(0, 5)]));
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let forced: Vec<_> = index.forced().collect();
        assert_eq!(forced.len(), 2);
        assert!(forced.iter().all(|op| op.preconditions.is_empty()));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut ops = operators();
        ops.push(op("move", &["a", "c_1_1", "c_1_2"], OperatorKind::Player, vec![Fact::new(0, 9)]));
        let index = OperatorIndex::new(&ops, &SimConfig::default());
        let found = index.resolve("move", &["a", "c_1_1", "c_1_2"]).unwrap();
        assert_eq!(found.preconditions, vec![Fact::new(0, 0)]);
    }
}
