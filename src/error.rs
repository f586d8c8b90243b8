use thiserror::Error;

use crate::grid::Direction;

/// Errors raised while decoding a grounded task or simulating a plan.
///
/// Every variant is fail-fast: the run that produced it is aborted and none of
/// its partial output should be trusted. Trace comparison mismatches are not
/// errors and are reported through [`crate::Comparison`] instead.
///
/// # Examples
///
/// ```
/// use sas_sim::SimError;
///
/// let err = SimError::UnknownOperator("move a c_1_1 c_1_2".to_string());
/// assert_eq!(format!("{}", err), "No grounded operator matches: move a c_1_1 c_1_2");
/// assert!(err.is_unknown_operator());
/// ```
#[derive(Error, Debug)]
pub enum SimError {
    /// Malformed grounded-task or plan text
    #[error("Parse error at line {line}: expected {expected}, found {found}")]
    Parse {
        line: usize,
        expected: String,
        found: String,
    },

    /// No grounded operator matches the requested name and arguments
    #[error("No grounded operator matches: {0}")]
    UnknownOperator(String),

    /// No applicable player operator moves in the requested direction
    #[error("No applicable move for direction '{direction}'")]
    NoMoveInDirection { direction: Direction },

    /// The resolved operator's preconditions do not hold in the current state
    #[error("Inapplicable action: {0}")]
    InapplicableAction(String),

    /// More than one applicable operator matches a single direction
    #[error("Ambiguous operators for direction '{direction}': {}", .candidates.join(", "))]
    AmbiguousDirection {
        direction: Direction,
        candidates: Vec<String>,
    },

    /// Forced closure did not reach a fixpoint within the ceiling
    #[error("Forced-action closure exceeded {ceiling} applications; possible cycle")]
    RunawayClosure { ceiling: usize },

    /// Explicit plans must only contain player actions
    #[error("Plan contains forced action: {0}")]
    ForcedActionInPlan(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn parse(line: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        SimError::Parse {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True for both lookup failures: by name and arguments, or by direction.
    pub fn is_unknown_operator(&self) -> bool {
        matches!(
            self,
            SimError::UnknownOperator(_) | SimError::NoMoveInDirection { .. }
        )
    }
}

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
