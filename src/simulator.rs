//! # Plan Expander
//!
//! Drives a plan through a decoded [`GroundedTask`], producing the full
//! low-level executed sequence in which player actions and the forced actions
//! they trigger are interleaved in true execution order.
//!
//! Every run has the same shape regardless of how the plan is written:
//!
//! 1. close the initial state under forced actions (the environment may need
//!    to settle before the first move);
//! 2. for each plan step: resolve it to a grounded player operator, check its
//!    preconditions, apply it, record it, then close under forced actions;
//! 3. close once more after the last step.
//!
//! The first error aborts the run. Nothing from an aborted run is returned.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use sas_sim::{GroundedTask, Plan, PlanFormat, SimConfig, Simulator};
//!
//! # fn main() -> sas_sim::Result<()> {
//! let config = SimConfig::default();
//! let task = GroundedTask::from_file("output.sas", &config)?;
//! let plan = Plan::from_file("level01.play.plan", PlanFormat::Auto)?;
//!
//! let simulator = Simulator::new(&task, &config);
//! let run = simulator.run_plan(&plan)?;
//! for action in run.executed() {
//!     println!("{}", action);
//! }
//! # Ok(())
//! # }
//! ```

use crate::closure::ForcedClosure;
use crate::grid::Direction;
use crate::operator::{ExecutedAction, Operator, OperatorName};
use crate::plan::Plan;
use crate::resolver::OperatorIndex;
use crate::trace::{project, Snapshot, SnapshotPolicy};
use crate::{GroundedTask, Result, SimConfig, SimError, State, Variable};

/// One executed operator and the state right after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: ExecutedAction,
    pub state: State,
}

/// The outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub initial_state: State,
    pub steps: Vec<Step>,
    pub final_state: State,
}

impl Run {
    /// The low-level executed sequence.
    pub fn executed(&self) -> Vec<ExecutedAction> {
        self.steps.iter().map(|step| step.action.clone()).collect()
    }

    pub fn player_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.action.is_forced()).count()
    }

    /// States selected by `policy`, starting with the initial state.
    ///
    /// Each state is paired with the action that labels it: `None` for the
    /// initial state, the player action of the turn under
    /// [`SnapshotPolicy::PlayerTurns`], the producing action otherwise.
    pub fn selected<'r>(&'r self, policy: &SnapshotPolicy) -> Vec<(Option<&'r ExecutedAction>, &'r State)> {
        let mut selected = vec![(None, &self.initial_state)];
        match policy {
            SnapshotPolicy::EveryAction => {
                selected.extend(self.steps.iter().map(|step| (Some(&step.action), &step.state)));
            }
            SnapshotPolicy::TickMarker(marker) => {
                selected.extend(
                    self.steps
                        .iter()
                        .filter(|step| step.action.name.head.eq_ignore_ascii_case(marker))
                        .map(|step| (Some(&step.action), &step.state)),
                );
            }
            SnapshotPolicy::PlayerTurns => {
                let turns: Vec<usize> = self
                    .steps
                    .iter()
                    .enumerate()
                    .filter(|(_, step)| !step.action.is_forced())
                    .map(|(i, _)| i)
                    .collect();
                for (n, &start) in turns.iter().enumerate() {
                    // the turn ends just before the next player action
                    let end = turns.get(n + 1).copied().unwrap_or(self.steps.len());
                    selected.push((Some(&self.steps[start].action), &self.steps[end - 1].state));
                }
            }
        }
        selected
    }

    pub fn states<'r>(&'r self, policy: &SnapshotPolicy) -> Vec<&'r State> {
        self.selected(policy).into_iter().map(|(_, state)| state).collect()
    }

    /// Projects the states selected by `policy` into semantic snapshots.
    pub fn snapshots(&self, variables: &[Variable], policy: &SnapshotPolicy) -> Vec<Snapshot> {
        self.states(policy)
            .into_iter()
            .map(|state| project(variables, state))
            .collect()
    }
}

/// Simulator over one decoded task.
#[derive(Debug, Clone)]
pub struct Simulator<'t> {
    task: &'t GroundedTask,
    index: OperatorIndex<'t>,
    closure: ForcedClosure<'t>,
    config: SimConfig,
}

impl<'t> Simulator<'t> {
    pub fn new(task: &'t GroundedTask, config: &SimConfig) -> Self {
        let index = OperatorIndex::new(&task.operators, config);
        let closure = ForcedClosure::new(index.forced(), config.step_ceiling);
        Self {
            task,
            index,
            closure,
            config: config.clone(),
        }
    }

    pub fn task(&self) -> &'t GroundedTask {
        self.task
    }

    pub fn index(&self) -> &OperatorIndex<'t> {
        &self.index
    }

    pub fn closure(&self) -> &ForcedClosure<'t> {
        &self.closure
    }

    /// Starts a run from the initial state, settling it under forced actions.
    pub fn begin(&self) -> Result<Execution<'_, 't>> {
        let mut execution = Execution {
            simulator: self,
            state: self.task.initial_state.clone(),
            steps: Vec::new(),
        };
        execution.settle()?;
        Ok(execution)
    }

    /// Explicit-action mode.
    ///
    /// Fails with [`SimError::ForcedActionInPlan`] before simulating anything
    /// if any action names a forced operator.
    pub fn run_actions(&self, actions: &[OperatorName]) -> Result<Run> {
        if let Some(forced) = actions
            .iter()
            .find(|action| self.config.is_forced_head(&action.head))
        {
            return Err(SimError::ForcedActionInPlan(forced.canonical()));
        }
        let mut execution = self.begin()?;
        for action in actions {
            execution.play_action(action)?;
        }
        execution.finish()
    }

    /// Directional mode.
    pub fn run_directions(&self, directions: &[Direction]) -> Result<Run> {
        let mut execution = self.begin()?;
        for &direction in directions {
            execution.play_direction(direction)?;
        }
        execution.finish()
    }

    pub fn run_plan(&self, plan: &Plan) -> Result<Run> {
        match plan {
            Plan::Actions(actions) => self.run_actions(actions),
            Plan::Directions(directions) => self.run_directions(directions),
        }
    }
}

/// An in-progress run owning its mutable state.
#[derive(Debug)]
pub struct Execution<'s, 't> {
    simulator: &'s Simulator<'t>,
    state: State,
    steps: Vec<Step>,
}

impl<'s, 't> Execution<'s, 't> {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolves, checks and applies one explicit action, then settles.
    pub fn play_action(&mut self, action: &OperatorName) -> Result<()> {
        let op = self.simulator.index.resolve(&action.head, &action.args)?;
        if op.is_forced() {
            return Err(SimError::ForcedActionInPlan(op.name.canonical()));
        }
        self.play(op)
    }

    /// Resolves one directional intent against the current state, then settles.
    pub fn play_direction(&mut self, direction: Direction) -> Result<()> {
        let op = self
            .simulator
            .index
            .resolve_direction(direction, &self.state)?;
        log::debug!("Direction {} resolved to {}", direction, op.name);
        self.play(op)
    }

    fn play(&mut self, op: &'t Operator) -> Result<()> {
        if !op.is_applicable(&self.state) {
            return Err(SimError::InapplicableAction(op.name.canonical()));
        }
        op.apply(&mut self.state);
        log::debug!("Applied {}", op.name);
        self.steps.push(Step {
            action: op.executed(),
            state: self.state.clone(),
        });
        self.settle()
    }

    fn settle(&mut self) -> Result<()> {
        let steps = &mut self.steps;
        self.simulator
            .closure
            .close_observed(&mut self.state, |op, state| {
                steps.push(Step {
                    action: op.executed(),
                    state: state.clone(),
                })
            })?;
        Ok(())
    }

    /// Runs the final closure and seals the run.
    pub fn finish(mut self) -> Result<Run> {
        self.settle()?;
        let run = Run {
            initial_state: self.simulator.task.initial_state.clone(),
            steps: self.steps,
            final_state: self.state,
        };
        log::info!(
            "Run finished: {} executed actions ({} player)",
            run.steps.len(),
            run.player_steps()
        );
        Ok(run)
    }
}
