mod closure;
mod config;
mod error;
mod grid;
mod operator;
mod plan;
mod resolver;
mod sas;
mod simulator;
mod state;
mod trace;

pub use closure::{close, ForcedClosure};
pub use config::{SimConfig, DEFAULT_STEP_CEILING};
pub use error::{Result, SimError};
pub use grid::{Cell, Direction, DirectionToken};
pub use operator::{ExecutedAction, Operator, OperatorKey, OperatorKind, OperatorName};
pub use plan::{
    detect_plan_format, directions_from_actions, format_action_plan, format_direction_plan,
    parse_action_line, parse_action_plan, parse_direction_plan, Plan, PlanFormat,
};
pub use resolver::OperatorIndex;
pub use sas::{GroundedTask, Variable};
pub use simulator::{Execution, Run, Simulator, Step};
pub use state::{Fact, State};
pub use trace::{
    compare, compare_with_records, project, read_trace, read_trace_file, records_from_run,
    write_trace, CellKind, Comparison, Mismatch, Snapshot, SnapshotPolicy, TraceRecord,
};
