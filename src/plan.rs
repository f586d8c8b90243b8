//! Plan text: explicit action plans and directional plans.
//!
//! Explicit plans carry one `(name arg1 arg2 ...)` per line, optionally
//! prefixed with a step number (`3: (move a c_1_1 c_1_2)`) or suffixed with a
//! duration (`(move a c_1_1 c_1_2) [1]`). Directional plans carry one
//! direction token per line, bare or parenthesised. In both formats blank
//! lines and lines starting with `;` or `#` are ignored.

use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::grid::{Cell, Direction, DirectionToken};
use crate::operator::{ExecutedAction, OperatorName};
use crate::{Result, SimError};

fn sexp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(\s*([^\s()]+)\s*([^()]*)\)").expect("s-expression pattern is a valid regex")
    })
}

fn is_ignored(line: &str) -> bool {
    line.is_empty() || line.starts_with(';') || line.starts_with('#')
}

/// Extracts `(name, args)` from a single plan line.
///
/// # Examples
///
/// ```
/// use sas_sim::parse_action_line;
///
/// let name = parse_action_line("0: (move a c_1_1 c_1_2) [1]").unwrap();
/// assert_eq!(name.head, "move");
/// assert_eq!(name.args, vec!["a", "c_1_1", "c_1_2"]);
/// assert!(parse_action_line("move a b").is_none());
/// ```
pub fn parse_action_line(line: &str) -> Option<OperatorName> {
    let caps = sexp_pattern().captures(line.trim())?;
    let head = caps.get(1)?.as_str();
    let args = caps
        .get(2)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>())
        .unwrap_or_default();
    Some(OperatorName::new(head, args))
}

/// Parses an explicit action plan. Unparseable lines are errors.
pub fn parse_action_plan(text: &str) -> Result<Vec<OperatorName>> {
    let mut actions = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if is_ignored(line) {
            continue;
        }
        let action = parse_action_line(line)
            .ok_or_else(|| SimError::parse(i + 1, "(name args...)", line))?;
        actions.push(action);
    }
    Ok(actions)
}

/// First token of a usable line: the head inside parentheses, or the first word.
fn leading_token(line: &str) -> Option<&str> {
    if is_ignored(line) {
        return None;
    }
    match line.find('(') {
        Some(lparen) => {
            let rest = &line[lparen + 1..];
            let inside = rest.find(')').map_or(rest, |rparen| &rest[..rparen]);
            inside.split_whitespace().next()
        }
        None => line.split_whitespace().next(),
    }
}

/// Parses a directional plan through the alias table.
///
/// Unknown tokens, no-op tokens and plans without any direction are errors.
pub fn parse_direction_plan(text: &str) -> Result<Vec<Direction>> {
    let mut directions = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let Some(token) = leading_token(raw.trim()) else {
            continue;
        };
        match DirectionToken::lookup(token) {
            Some(DirectionToken::Move(direction)) => directions.push(direction),
            Some(DirectionToken::Noop) => {
                return Err(SimError::parse(
                    i + 1,
                    "a movement direction (no-op is unsupported)",
                    token,
                ))
            }
            None => return Err(SimError::parse(i + 1, "a direction token", token)),
        }
    }
    if directions.is_empty() {
        return Err(SimError::parse(
            text.lines().count() + 1,
            "at least one direction",
            "end of input",
        ));
    }
    Ok(directions)
}

/// How to interpret a human-written plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanFormat {
    #[default]
    Auto,
    Actions,
    Directions,
}

impl FromStr for PlanFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PlanFormat::Auto),
            "actions" => Ok(PlanFormat::Actions),
            "directions" => Ok(PlanFormat::Directions),
            other => Err(SimError::parse(0, "auto, actions or directions", other)),
        }
    }
}

/// `Directions` when every usable line starts with a known direction alias.
pub fn detect_plan_format(text: &str) -> Result<PlanFormat> {
    let tokens: Vec<&str> = text
        .lines()
        .filter_map(|line| leading_token(line.trim()))
        .collect();
    if tokens.is_empty() {
        return Err(SimError::parse(
            text.lines().count() + 1,
            "at least one plan step",
            "end of input",
        ));
    }
    if tokens.iter().all(|t| DirectionToken::lookup(t).is_some()) {
        Ok(PlanFormat::Directions)
    } else {
        Ok(PlanFormat::Actions)
    }
}

/// A parsed human plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Actions(Vec<OperatorName>),
    Directions(Vec<Direction>),
}

impl Plan {
    pub fn parse(text: &str, format: PlanFormat) -> Result<Self> {
        let format = match format {
            PlanFormat::Auto => detect_plan_format(text)?,
            other => other,
        };
        match format {
            PlanFormat::Directions => Ok(Plan::Directions(parse_direction_plan(text)?)),
            _ => Ok(Plan::Actions(parse_action_plan(text)?)),
        }
    }

    pub fn from_file(path: impl AsRef<Path>, format: PlanFormat) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, format)
    }

    pub fn len(&self) -> usize {
        match self {
            Plan::Actions(actions) => actions.len(),
            Plan::Directions(directions) => directions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recovers the directional intents behind an executed sequence.
///
/// Forced actions are skipped, as are player actions whose second and third
/// arguments are not adjacent cells.
pub fn directions_from_actions(executed: &[ExecutedAction]) -> Vec<Direction> {
    executed
        .iter()
        .filter(|action| !action.is_forced())
        .filter_map(|action| {
            let args = &action.name.args;
            let from = Cell::parse(args.get(1)?)?;
            let to = Cell::parse(args.get(2)?)?;
            Direction::between(from, to)
        })
        .collect()
}

/// Renders one `(name args...)` per line.
pub fn format_action_plan<'a, I>(actions: I) -> String
where
    I: IntoIterator<Item = &'a OperatorName>,
{
    actions
        .into_iter()
        .map(|action| format!("{}\n", action))
        .collect()
}

/// Renders one `(direction)` per line.
pub fn format_direction_plan(directions: &[Direction]) -> String {
    directions
        .iter()
        .map(|direction| format!("({})\n", direction))
        .collect()
}
