//! # Grounded Task Decoder
//!
//! Decodes the positional text format emitted by a planner's translation step
//! into a [`GroundedTask`]: the state variables with their atom labels, the
//! initial [`State`], the goal facts, and every grounded [`Operator`].
//!
//! The format is strictly ordered:
//!
//! 1. `begin_version` / version / `end_version`, `begin_metric` / metric / `end_metric`
//! 2. variable count, then per variable `begin_variable`, name, axiom layer,
//!    domain size, one atom label per value, `end_variable`
//! 3. mutex group count, then per group `begin_mutex_group`, fact count,
//!    `var value` lines, `end_mutex_group`
//! 4. `begin_state`, one value per variable, `end_state`
//! 5. `begin_goal`, fact count, `var value` lines, `end_goal`
//! 6. operator count, then per operator `begin_operator`, name line, prevail
//!    count and `var value` lines, effect count and effect lines
//!    (`guards [guardVar guardVal]* var old new`), cost, `end_operator`
//! 7. optionally, an axiom rule count followed by `begin_rule` blocks
//!
//! Blank lines are skipped. Every other line must be exactly what the
//! position demands: a count that disagrees with the lines that follow, an
//! index outside its variable or domain, or trailing garbage is reported as a
//! [`SimError::Parse`] naming the expected and found tokens.
//!
//! Effect guards and non-negative `old` values are folded into the operator's
//! preconditions, so an operator is applicable only where all of its effects
//! fire unconditionally.

use std::path::Path;
use std::str::FromStr;

use crate::operator::{Operator, OperatorKind, OperatorName};
use crate::{Fact, Result, SimConfig, SimError, State};

/// A finite-domain state variable and the atom label of each of its values.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub axiom_layer: i64,
    pub atoms: Vec<String>,
}

impl Variable {
    pub fn cardinality(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom(&self, value: usize) -> Option<&str> {
        self.atoms.get(value).map(String::as_str)
    }
}

/// A fully decoded grounded planning task.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedTask {
    pub variables: Vec<Variable>,
    pub initial_state: State,
    pub goal: Vec<Fact>,
    pub operators: Vec<Operator>,
}

impl GroundedTask {
    /// Decodes with the default configuration.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &SimConfig::default())
    }

    /// Decodes, classifying operators with `config`'s forced prefixes.
    pub fn parse_with(text: &str, config: &SimConfig) -> Result<Self> {
        let mut cursor = Cursor::new(text);

        cursor.expect("begin_version")?;
        cursor.next_number::<i64>("version number")?;
        cursor.expect("end_version")?;
        cursor.expect("begin_metric")?;
        cursor.next_number::<i64>("metric flag")?;
        cursor.expect("end_metric")?;

        let variables = parse_variables(&mut cursor)?;
        skip_mutex_groups(&mut cursor, &variables)?;
        let initial_state = parse_initial_state(&mut cursor, &variables)?;

        cursor.expect("begin_goal")?;
        let goal = parse_facts(&mut cursor, &variables, "goal fact count")?;
        cursor.expect("end_goal")?;

        let operators = parse_operators(&mut cursor, &variables, config)?;
        if !cursor.is_done() {
            skip_axioms(&mut cursor, &variables)?;
        }
        cursor.expect_end()?;

        log::debug!(
            "Decoded grounded task: {} variables, {} operators ({} forced)",
            variables.len(),
            operators.len(),
            operators.iter().filter(|op| op.is_forced()).count()
        );

        Ok(Self {
            variables,
            initial_state,
            goal,
            operators,
        })
    }

    /// Reads and decodes a grounded task file.
    pub fn from_file(path: impl AsRef<Path>, config: &SimConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_with(&text, config)
    }

    pub fn forced_operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter().filter(|op| op.is_forced())
    }

    pub fn player_operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter().filter(|op| !op.is_forced())
    }

    /// Atom labels currently selected by `state`, one per variable.
    pub fn atoms<'a>(&'a self, state: &'a State) -> impl Iterator<Item = &'a str> + 'a {
        self.variables
            .iter()
            .zip(state.values())
            .filter_map(|(var, &value)| var.atom(value))
    }
}

/// Non-blank lines with their 1-based line numbers.
struct Cursor<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
    last_line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        let last_line = text.lines().count();
        Self {
            lines,
            pos: 0,
            last_line,
        }
    }

    /// Upper bound on how many more items any count can describe.
    fn remaining(&self) -> usize {
        self.lines.len() - self.pos.min(self.lines.len())
    }

    fn is_done(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn next_line(&mut self, expected: &str) -> Result<(usize, &'a str)> {
        match self.lines.get(self.pos) {
            Some(&entry) => {
                self.pos += 1;
                Ok(entry)
            }
            None => Err(SimError::parse(self.last_line + 1, expected, "end of input")),
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        let (line, text) = self.next_line(token)?;
        if text == token {
            Ok(())
        } else {
            Err(SimError::parse(line, token, text))
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.lines.get(self.pos) {
            None => Ok(()),
            Some(&(line, text)) => Err(SimError::parse(line, "end of input", text)),
        }
    }

    fn next_number<T: FromStr>(&mut self, expected: &str) -> Result<T> {
        let (line, text) = self.next_line(expected)?;
        text.parse()
            .map_err(|_| SimError::parse(line, expected, text))
    }

    /// A line of exactly `count` integers.
    fn next_numbers(&mut self, count: usize, expected: &str) -> Result<(usize, Vec<i64>)> {
        let (line, text) = self.next_line(expected)?;
        let numbers = parse_numbers(text).ok_or_else(|| SimError::parse(line, expected, text))?;
        if numbers.len() != count {
            return Err(SimError::parse(line, expected, text));
        }
        Ok((line, numbers))
    }
}

fn parse_numbers(text: &str) -> Option<Vec<i64>> {
    text.split_whitespace().map(|tok| tok.parse().ok()).collect()
}

fn parse_variables(cursor: &mut Cursor<'_>) -> Result<Vec<Variable>> {
    let count: usize = cursor.next_number("variable count")?;
    let mut variables = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        cursor.expect("begin_variable")?;
        let (_, name) = cursor.next_line("variable name")?;
        let axiom_layer: i64 = cursor.next_number("axiom layer")?;
        let domain: usize = cursor.next_number("domain size")?;
        let mut atoms = Vec::with_capacity(domain.min(cursor.remaining()));
        for _ in 0..domain {
            let (line, atom) = cursor.next_line("atom label")?;
            if atom == "end_variable" {
                return Err(SimError::parse(line, "atom label", atom));
            }
            atoms.push(atom.to_string());
        }
        cursor.expect("end_variable")?;
        variables.push(Variable {
            name: name.to_string(),
            axiom_layer,
            atoms,
        });
    }
    Ok(variables)
}

fn skip_mutex_groups(cursor: &mut Cursor<'_>, variables: &[Variable]) -> Result<()> {
    let count: usize = cursor.next_number("mutex group count")?;
    for _ in 0..count {
        cursor.expect("begin_mutex_group")?;
        parse_facts(cursor, variables, "mutex fact count")?;
        cursor.expect("end_mutex_group")?;
    }
    Ok(())
}

fn parse_initial_state(cursor: &mut Cursor<'_>, variables: &[Variable]) -> Result<State> {
    cursor.expect("begin_state")?;
    let mut values = Vec::with_capacity(variables.len());
    for var in variables {
        let expected = format!("initial value of {}", var.name);
        let (line, text) = cursor.next_line(&expected)?;
        let value: usize = text
            .parse()
            .map_err(|_| SimError::parse(line, expected.as_str(), text))?;
        if value >= var.cardinality() {
            return Err(SimError::parse(
                line,
                format!("value below {} for {}", var.cardinality(), var.name),
                text,
            ));
        }
        values.push(value);
    }
    cursor.expect("end_state")?;
    Ok(State::new(values))
}

/// A count followed by that many `var value` lines.
fn parse_facts(cursor: &mut Cursor<'_>, variables: &[Variable], what: &str) -> Result<Vec<Fact>> {
    let count: usize = cursor.next_number(what)?;
    let mut facts = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        let (line, numbers) = cursor.next_numbers(2, "variable value pair")?;
        facts.push(checked_fact(line, variables, numbers[0], numbers[1])?);
    }
    Ok(facts)
}

fn checked_var(line: usize, variables: &[Variable], var: i64) -> Result<usize> {
    usize::try_from(var)
        .ok()
        .filter(|&v| v < variables.len())
        .ok_or_else(|| {
            SimError::parse(
                line,
                format!("variable index below {}", variables.len()),
                var.to_string(),
            )
        })
}

fn checked_fact(line: usize, variables: &[Variable], var: i64, value: i64) -> Result<Fact> {
    let var = checked_var(line, variables, var)?;
    let cardinality = variables[var].cardinality();
    let value = usize::try_from(value)
        .ok()
        .filter(|&v| v < cardinality)
        .ok_or_else(|| {
            SimError::parse(
                line,
                format!("value below {} for {}", cardinality, variables[var].name),
                value.to_string(),
            )
        })?;
    Ok(Fact::new(var, value))
}

fn parse_name(line: usize, text: &str) -> Result<OperatorName> {
    let inner = match (text.starts_with('('), text.ends_with(')')) {
        (true, true) => &text[1..text.len() - 1],
        (false, false) => text,
        _ => return Err(SimError::parse(line, "operator name (head args...)", text)),
    };
    let mut tokens = inner.split_whitespace();
    let head = tokens
        .next()
        .ok_or_else(|| SimError::parse(line, "operator name", text))?;
    Ok(OperatorName::new(head, tokens))
}

fn parse_operators(
    cursor: &mut Cursor<'_>,
    variables: &[Variable],
    config: &SimConfig,
) -> Result<Vec<Operator>> {
    let count: usize = cursor.next_number("operator count")?;
    let mut operators = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        operators.push(parse_operator(cursor, variables, config)?);
    }
    Ok(operators)
}

fn parse_operator(
    cursor: &mut Cursor<'_>,
    variables: &[Variable],
    config: &SimConfig,
) -> Result<Operator> {
    cursor.expect("begin_operator")?;
    let (line, text) = cursor.next_line("operator name")?;
    let name = parse_name(line, text)?;

    let mut preconditions = parse_facts(cursor, variables, "prevail condition count")?;

    let effect_count: usize = cursor.next_number("effect count")?;
    let mut effects = Vec::with_capacity(effect_count.min(cursor.remaining()));
    for _ in 0..effect_count {
        let (line, text) = cursor.next_line("effect line")?;
        let numbers = parse_numbers(text)
            .ok_or_else(|| SimError::parse(line, "effect line of integers", text))?;
        let guards = numbers
            .first()
            .and_then(|&n| usize::try_from(n).ok())
            .ok_or_else(|| SimError::parse(line, "effect guard count", text))?;
        let arity = guards
            .checked_mul(2)
            .and_then(|n| n.checked_add(4))
            .ok_or_else(|| SimError::parse(line, "effect guard count", text))?;
        if numbers.len() != arity {
            return Err(SimError::parse(
                line,
                format!("{} integers for {} guard(s)", arity, guards),
                text,
            ));
        }
        for pair in numbers[1..1 + 2 * guards].chunks(2) {
            push_unique(&mut preconditions, checked_fact(line, variables, pair[0], pair[1])?);
        }
        let tail = &numbers[1 + 2 * guards..];
        let var = checked_var(line, variables, tail[0])?;
        if tail[1] != -1 {
            push_unique(&mut preconditions, checked_fact(line, variables, tail[0], tail[1])?);
        }
        effects.push(checked_fact(line, variables, var as i64, tail[2])?);
    }

    let cost: i64 = cursor.next_number("operator cost")?;
    cursor.expect("end_operator")?;

    let kind = if config.is_forced_head(&name.head) {
        OperatorKind::Forced
    } else {
        OperatorKind::Player
    };
    warn_on_conflicts(&name, &preconditions);

    Ok(Operator {
        name,
        kind,
        preconditions,
        effects,
        cost,
    })
}

fn push_unique(facts: &mut Vec<Fact>, fact: Fact) {
    if !facts.contains(&fact) {
        facts.push(fact);
    }
}

// Folded guards that pin one variable to two values make the operator dead.
fn warn_on_conflicts(name: &OperatorName, preconditions: &[Fact]) {
    for (i, a) in preconditions.iter().enumerate() {
        if let Some(b) = preconditions[i + 1..]
            .iter()
            .find(|b| b.var == a.var && b.value != a.value)
        {
            log::warn!(
                "Operator {} requires conflicting values {} and {}; it can never apply",
                name,
                a,
                b
            );
        }
    }
}

fn skip_axioms(cursor: &mut Cursor<'_>, variables: &[Variable]) -> Result<()> {
    let count: usize = cursor.next_number("axiom rule count")?;
    for _ in 0..count {
        cursor.expect("begin_rule")?;
        parse_facts(cursor, variables, "rule condition count")?;
        let (line, numbers) = cursor.next_numbers(3, "rule effect (var old new)")?;
        checked_var(line, variables, numbers[0])?;
        cursor.expect("end_rule")?;
    }
    Ok(())
}
