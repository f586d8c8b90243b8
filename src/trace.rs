//! # Trace Projection and Comparison
//!
//! A raw [`State`] is projected into a [`Snapshot`]: the agent position and
//! the gem, stone and dirt positions, each as an index into the interior of
//! the board. Snapshot sequences from a simulated run are then compared
//! against a reference trace produced by the native game.
//!
//! ## Projection
//!
//! Only the atom label selected by each variable is inspected. Labels that
//! name a cell (`c_<row>_<col>`) contribute to the inferred board extent;
//! among those, positively asserted labels (not starting with `NegatedAtom`)
//! are classified by keyword: `agent-at`, then `gem`, then `stone`, then
//! `dirt`.
//!
//! Interior coordinates are 1-based. When any label names row 0 or column 0
//! the board carries a one-cell border: row/column 0 and the maximum
//! row/column are then border cells and are never reported. The interior
//! index of `(r, c)` is `(r - 1) * width + (c - 1)`.
//!
//! ## Comparison
//!
//! [`compare`] walks both sequences up to the shorter length and reports each
//! differing field as its own [`Mismatch`], plus one more when the lengths
//! differ. It never stops early.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::simulator::Run;
use crate::{Result, SimConfig, State, Variable};

/// Semantic view of a state used for cross-implementation comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub agent: Option<usize>,
    pub gems: BTreeSet<usize>,
    pub stones: BTreeSet<usize>,
    pub dirt: BTreeSet<usize>,
}

/// Which states of a run become snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotPolicy {
    /// After every executed operator
    EveryAction,
    /// After each player action and its forced closure
    PlayerTurns,
    /// After every operator whose head equals the marker
    TickMarker(String),
}

impl SnapshotPolicy {
    /// `TickMarker` when the configuration names one, else `PlayerTurns`.
    pub fn from_config(config: &SimConfig) -> Self {
        match &config.tick_marker {
            Some(marker) => SnapshotPolicy::TickMarker(marker.clone()),
            None => SnapshotPolicy::PlayerTurns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    max_row: usize,
    max_col: usize,
    bordered: bool,
}

impl Extent {
    fn infer<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut extent = Extent {
            max_row: 0,
            max_col: 0,
            bordered: false,
        };
        for cell in cells {
            extent.max_row = extent.max_row.max(cell.row);
            extent.max_col = extent.max_col.max(cell.col);
            extent.bordered |= cell.row == 0 || cell.col == 0;
        }
        extent
    }

    fn width(&self) -> usize {
        if self.bordered {
            self.max_col.saturating_sub(1)
        } else {
            self.max_col
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.row == 0 || cell.col == 0 {
            return None;
        }
        if self.bordered && (cell.row == self.max_row || cell.col == self.max_col) {
            return None;
        }
        Some((cell.row - 1) * self.width() + (cell.col - 1))
    }
}

/// Projects `state` into a snapshot using the variables' atom labels.
pub fn project(variables: &[Variable], state: &State) -> Snapshot {
    let labelled: Vec<(String, Cell)> = variables
        .iter()
        .zip(state.values())
        .filter_map(|(var, &value)| var.atom(value))
        .filter_map(|label| Cell::parse(label).map(|cell| (label.to_ascii_lowercase(), cell)))
        .collect();
    let extent = Extent::infer(labelled.iter().map(|(_, cell)| cell));

    let mut snapshot = Snapshot::default();
    for (label, cell) in &labelled {
        if label.starts_with("negatedatom") {
            continue;
        }
        let Some(idx) = extent.index(*cell) else {
            continue;
        };
        if label.contains("agent-at") {
            snapshot.agent = Some(idx);
        } else if label.contains("gem") {
            snapshot.gems.insert(idx);
        } else if label.contains("stone") {
            snapshot.stones.insert(idx);
        } else if label.contains("dirt") {
            snapshot.dirt.insert(idx);
        }
    }
    snapshot
}

mod agent_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(agent: &Option<usize>, s: S) -> Result<S::Ok, S::Error> {
        match agent {
            Some(idx) => s.serialize_u64(*idx as u64),
            None => s.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        let raw = Option::<i64>::deserialize(d)?;
        Ok(raw.and_then(|v| usize::try_from(v).ok()))
    }
}

/// One line of a JSON Lines trace. A negative agent index means no agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    #[serde(default)]
    pub action: String,
    #[serde(with = "agent_index")]
    pub agent: Option<usize>,
    #[serde(default)]
    pub gems: BTreeSet<usize>,
    #[serde(default)]
    pub stones: BTreeSet<usize>,
    #[serde(default)]
    pub dirt: BTreeSet<usize>,
}

impl TraceRecord {
    pub fn new(action: impl Into<String>, snapshot: &Snapshot) -> Self {
        Self {
            action: action.into(),
            agent: snapshot.agent,
            gems: snapshot.gems.clone(),
            stones: snapshot.stones.clone(),
            dirt: snapshot.dirt.clone(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            agent: self.agent,
            gems: self.gems.clone(),
            stones: self.stones.clone(),
            dirt: self.dirt.clone(),
        }
    }
}

/// Parses a JSON Lines trace; blank lines are skipped.
pub fn read_trace(text: &str) -> Result<Vec<TraceRecord>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

pub fn read_trace_file(path: impl AsRef<Path>) -> Result<Vec<TraceRecord>> {
    read_trace(&std::fs::read_to_string(path)?)
}

/// Renders records as JSON Lines, one per line.
pub fn write_trace(records: &[TraceRecord]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Labels the run's selected states `init`, then `name args...`.
pub fn records_from_run(run: &Run, variables: &[Variable], policy: &SnapshotPolicy) -> Vec<TraceRecord> {
    run.selected(policy)
        .into_iter()
        .map(|(action, state)| {
            let label = action.map_or_else(|| "init".to_string(), |a| a.name.canonical());
            TraceRecord::new(label, &project(variables, state))
        })
        .collect()
}

/// Set-valued snapshot fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Gems,
    Stones,
    Dirt,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellKind::Gems => "gems",
            CellKind::Stones => "stones",
            CellKind::Dirt => "dirt",
        })
    }
}

/// A single comparator diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Agent {
        step: usize,
        candidate: Option<usize>,
        reference: Option<usize>,
    },
    Cells {
        step: usize,
        kind: CellKind,
        /// In the reference but not the candidate
        missing: Vec<usize>,
        /// In the candidate but not the reference
        unexpected: Vec<usize>,
    },
    Length {
        candidate: usize,
        reference: usize,
    },
}

fn fmt_agent(agent: Option<usize>) -> String {
    agent.map_or_else(|| "none".to_string(), |idx| idx.to_string())
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Agent {
                step,
                candidate,
                reference,
            } => write!(
                f,
                "step {}: agent {} != reference {}",
                step,
                fmt_agent(*candidate),
                fmt_agent(*reference)
            ),
            Mismatch::Cells {
                step,
                kind,
                missing,
                unexpected,
            } => write!(
                f,
                "step {}: {} missing {:?} unexpected {:?}",
                step, kind, missing, unexpected
            ),
            Mismatch::Length {
                candidate,
                reference,
            } => write!(
                f,
                "trace length {} != reference {}",
                candidate, reference
            ),
        }
    }
}

/// Every difference found between two snapshot sequences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    pub mismatches: Vec<Mismatch>,
}

impl Comparison {
    pub fn count(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn compare_cells(
    step: usize,
    kind: CellKind,
    candidate: &BTreeSet<usize>,
    reference: &BTreeSet<usize>,
) -> Option<Mismatch> {
    if candidate == reference {
        return None;
    }
    Some(Mismatch::Cells {
        step,
        kind,
        missing: reference.difference(candidate).copied().collect(),
        unexpected: candidate.difference(reference).copied().collect(),
    })
}

/// Compares `candidate` against `reference`, enumerating every mismatch.
///
/// # Examples
///
/// ```
/// use sas_sim::{compare, Snapshot};
///
/// let reference = vec![Snapshot::default(), Snapshot { agent: Some(3), ..Default::default() }];
/// let candidate = vec![Snapshot::default()];
///
/// let comparison = compare(&candidate, &reference);
/// assert_eq!(comparison.count(), 1); // only the length differs
/// ```
pub fn compare(candidate: &[Snapshot], reference: &[Snapshot]) -> Comparison {
    let mut mismatches = Vec::new();
    for (step, (c, r)) in candidate.iter().zip(reference).enumerate() {
        if c.agent != r.agent {
            mismatches.push(Mismatch::Agent {
                step,
                candidate: c.agent,
                reference: r.agent,
            });
        }
        mismatches.extend(compare_cells(step, CellKind::Gems, &c.gems, &r.gems));
        mismatches.extend(compare_cells(step, CellKind::Stones, &c.stones, &r.stones));
        mismatches.extend(compare_cells(step, CellKind::Dirt, &c.dirt, &r.dirt));
    }
    if candidate.len() != reference.len() {
        mismatches.push(Mismatch::Length {
            candidate: candidate.len(),
            reference: reference.len(),
        });
    }

    for mismatch in &mismatches {
        log::warn!("Trace mismatch: {}", mismatch);
    }
    if mismatches.is_empty() {
        log::info!("Traces match over {} steps", candidate.len());
    }
    Comparison { mismatches }
}

/// Compares a simulated run against reference records.
pub fn compare_with_records(candidate: &[Snapshot], reference: &[TraceRecord]) -> Comparison {
    let reference: Vec<Snapshot> = reference.iter().map(TraceRecord::snapshot).collect();
    compare(candidate, &reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(atoms: &[&str]) -> Variable {
        Variable {
            name: "v".to_string(),
            axiom_layer: -1,
            atoms: atoms.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn cells(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_project_with_border() {
        let variables = vec![
            variable(&["Atom agent-at(c_1_1)", "NegatedAtom agent-at(c_1_1)"]),
            variable(&["Atom gem(c_2_3)", "NegatedAtom gem(c_2_3)"]),
            variable(&["Atom stone(c_3_2)", "Atom dirt(c_3_2)", "Atom empty(c_3_2)"]),
            variable(&["Atom wall(c_0_0)"]),
            variable(&["Atom wall(c_4_4)"]),
            variable(&["Atom got-gem()", "NegatedAtom got-gem()"]),
        ];
        let state = State::new(vec![0, 0, 1, 0, 0, 1]);
        let snapshot = project(&variables, &state);
        assert_eq!(snapshot.agent, Some(0));
        assert_eq!(snapshot.gems, cells(&[5]));
        assert!(snapshot.stones.is_empty());
        assert_eq!(snapshot.dirt, cells(&[7]));
    }

    #[test]
    fn test_project_skips_negated_and_border() {
        let variables = vec![
            variable(&["NegatedAtom agent-at(c_1_1)"]),
            variable(&["Atom stone(c_0_2)"]),
            variable(&["Atom stone(c_2_2)"]),
            variable(&["Atom dirt(c_3_3)"]),
        ];
        let state = State::new(vec![0, 0, 0, 0]);
        let snapshot = project(&variables, &state);
        assert_eq!(snapshot.agent, None);
        // c_0_2 is border, and with a max of 3 so is c_3_3
        assert_eq!(snapshot.stones, cells(&[3]));
        assert!(snapshot.dirt.is_empty());
    }

    #[test]
    fn test_project_without_border() {
        let variables = vec![
            variable(&["Atom agent-at(c_2_2)"]),
            variable(&["Atom gem(c_1_2)"]),
        ];
        let snapshot = project(&variables, &State::new(vec![0, 0]));
        assert_eq!(snapshot.agent, Some(3));
        assert_eq!(snapshot.gems, cells(&[1]));
    }

    #[test]
    fn test_compare_identical() {
        let a = Snapshot {
            agent: Some(1),
            gems: cells(&[2]),
            ..Default::default()
        };
        let comparison = compare(&[a.clone(), a.clone()], &[a.clone(), a]);
        assert!(comparison.is_match());
    }

    #[test]
    fn test_compare_reports_every_field() {
        let reference = Snapshot {
            agent: Some(1),
            gems: cells(&[2, 3]),
            stones: cells(&[4]),
            dirt: cells(&[5]),
        };
        let candidate = Snapshot {
            agent: None,
            gems: cells(&[2]),
            stones: cells(&[4, 6]),
            dirt: cells(&[5]),
        };
        let comparison = compare(
            &[candidate.clone(), candidate],
            &[reference.clone(), reference.clone(), reference],
        );
        // three fields at each of two steps, plus the length
        assert_eq!(comparison.count(), 7);
        assert_eq!(
            comparison.mismatches[1],
            Mismatch::Cells {
                step: 0,
                kind: CellKind::Gems,
                missing: vec![3],
                unexpected: vec![],
            }
        );
        assert_eq!(
            comparison.mismatches[6],
            Mismatch::Length {
                candidate: 2,
                reference: 3
            }
        );
    }

    #[test]
    fn test_mismatch_display() {
        let agent = Mismatch::Agent {
            step: 4,
            candidate: Some(2),
            reference: None,
        };
        assert_eq!(agent.to_string(), "step 4: agent 2 != reference none");
        let cells = Mismatch::Cells {
            step: 1,
            kind: CellKind::Dirt,
            missing: vec![1],
            unexpected: vec![2, 3],
        };
        assert_eq!(cells.to_string(), "step 1: dirt missing [1] unexpected [2, 3]");
    }

    #[test]
    fn test_trace_jsonl() {
        let text = r#"{"action": "init", "agent": 4, "gems": [1, 2], "stones": [], "dirt": [7]}

{"action": "right", "agent": -1, "gems": [2]}
"#;
        let records = read_trace(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agent, Some(4));
        assert_eq!(records[0].dirt, cells(&[7]));
        assert_eq!(records[1].agent, None);
        assert!(records[1].stones.is_empty());

        let written = write_trace(&records).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains(r#""agent":-1"#));
        assert_eq!(read_trace(&written).unwrap(), records);
    }

    #[test]
    fn test_trace_rejects_bad_json() {
        assert!(read_trace("{\"action\": \"init\"}\n").is_err());
        assert!(read_trace("not json\n").is_err());
    }

    #[test]
    fn test_trace_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("native.jsonl");
        std::fs::write(&path, "{\"agent\": 0}\n").unwrap();
        let records = read_trace_file(&path).unwrap();
        assert_eq!(records[0].snapshot(), Snapshot { agent: Some(0), ..Default::default() });
    }
}
