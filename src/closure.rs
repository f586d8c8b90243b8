//! # Forced-Closure Engine
//!
//! Environment-driven operators (gravity, rolling, end-of-tick bookkeeping)
//! fire on their own whenever their preconditions hold. After every agent
//! action the simulator closes the state under these operators:
//!
//! 1. collect every forced operator applicable in the current state;
//! 2. if none, stop;
//! 3. otherwise apply all of them once, in ascending canonical-name order,
//!    and go back to 1.
//!
//! The set in step 1 is computed once per round, so every operator collected
//! in a round is applied in that round even if an earlier application in the
//! same round invalidated its preconditions. The canonical-name order makes
//! cascades involving several objects reproducible run to run.
//!
//! Cyclic forced definitions would loop forever, so the total number of
//! applications per closure is capped; exceeding the cap is a
//! [`SimError::RunawayClosure`].

use crate::operator::{ExecutedAction, Operator};
use crate::{Result, SimError, State};

/// Forced operators in application order, with the application ceiling.
#[derive(Debug, Clone)]
pub struct ForcedClosure<'t> {
    operators: Vec<&'t Operator>,
    ceiling: usize,
}

impl<'t> ForcedClosure<'t> {
    /// Sorts `operators` by canonical name; input order does not matter.
    pub fn new<I>(operators: I, ceiling: usize) -> Self
    where
        I: IntoIterator<Item = &'t Operator>,
    {
        let mut keyed: Vec<(String, &'t Operator)> = operators
            .into_iter()
            .map(|op| (op.name.canonical(), op))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            operators: keyed.into_iter().map(|(_, op)| op).collect(),
            ceiling,
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Runs to a fixpoint, returning every forced action applied in order.
    pub fn close(&self, state: &mut State) -> Result<Vec<ExecutedAction>> {
        let mut executed = Vec::new();
        self.close_observed(state, |op, _| executed.push(op.executed()))?;
        Ok(executed)
    }

    /// Like [`close`](Self::close), calling `observe` after each application
    /// with the operator and the resulting state. Returns the number applied.
    pub fn close_observed<F>(&self, state: &mut State, mut observe: F) -> Result<usize>
    where
        F: FnMut(&'t Operator, &State),
    {
        let mut applied = 0usize;
        let mut round = 0usize;
        loop {
            let ready: Vec<&'t Operator> = self
                .operators
                .iter()
                .copied()
                .filter(|op| op.is_applicable(state))
                .collect();
            if ready.is_empty() {
                break;
            }
            round += 1;
            log::debug!("Forced closure round {}: {} applicable", round, ready.len());

            for op in ready {
                if applied == self.ceiling {
                    return Err(SimError::RunawayClosure {
                        ceiling: self.ceiling,
                    });
                }
                op.apply(state);
                applied += 1;
                log::debug!("Applied forced {}", op.name);
                observe(op, state);
            }
        }
        Ok(applied)
    }
}

/// Closes `state` under `forced` with the given ceiling.
///
/// # Examples
///
/// ```
/// use sas_sim::{close, Fact, Operator, OperatorKind, OperatorName, State};
///
/// let fall = Operator::new(
///     OperatorName::new("fa_fall", ["stone", "c_1_1", "c_2_1"]),
///     OperatorKind::Forced,
///     vec![Fact::new(0, 0)],
///     vec![Fact::new(0, 1)],
/// );
///
/// let mut state = State::new(vec![0]);
/// let executed = close(&[&fall], &mut state, 100).unwrap();
/// assert_eq!(executed.len(), 1);
/// assert_eq!(state.values(), &[1]);
///
/// // already at the fixpoint
/// assert!(close(&[&fall], &mut state, 100).unwrap().is_empty());
/// ```
pub fn close(forced: &[&Operator], state: &mut State, ceiling: usize) -> Result<Vec<ExecutedAction>> {
    ForcedClosure::new(forced.iter().copied(), ceiling).close(state)
}
