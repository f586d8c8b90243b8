//! Grounded-task fixtures shared by the integration tests.

#![allow(dead_code)]

/// Value of the agent variable for interior cell `(r, c)` of the 3x3 board.
pub fn agent_value(r: usize, c: usize) -> usize {
    (r - 1) * 3 + (c - 1)
}

const HEADER: &str = "begin_version\n3\nend_version\nbegin_metric\n0\nend_metric\n";

/// A 3x3 interior with a wall border, the agent at c_1_1 and a gem at c_1_2.
///
/// Variables: 0 agent cell, 1 gem, 2 and 3 border walls, 4 tick flag.
/// Every move raises the tick flag; `__forced__end-tick` lowers it and
/// `fa_collect` removes the gem once the agent stands on it.
pub fn gem_board() -> String {
    board(true)
}

/// The same board without forced operators: stepping onto c_1_2 removes the
/// gem as part of the move itself.
pub fn plain_gem_board() -> String {
    board(false)
}

fn board(with_forced: bool) -> String {
    let mut out = String::from(HEADER);
    out.push_str("5\n");

    out.push_str("begin_variable\nvar0\n-1\n9\n");
    for r in 1..=3 {
        for c in 1..=3 {
            out.push_str(&format!("Atom agent-at(c_{}_{})\n", r, c));
        }
    }
    out.push_str("end_variable\n");
    out.push_str("begin_variable\nvar1\n-1\n2\nAtom gem(c_1_2)\nNegatedAtom gem(c_1_2)\nend_variable\n");
    out.push_str("begin_variable\nvar2\n-1\n1\nAtom wall(c_0_0)\nend_variable\n");
    out.push_str("begin_variable\nvar3\n-1\n1\nAtom wall(c_4_4)\nend_variable\n");
    out.push_str("begin_variable\nvar4\n-1\n2\nAtom idle()\nAtom moved()\nend_variable\n");

    out.push_str("0\n");
    out.push_str("begin_state\n0\n0\n0\n0\n0\nend_state\n");
    out.push_str("begin_goal\n1\n1 1\nend_goal\n");

    let mut operators = Vec::new();
    for r in 1..=3usize {
        for c in 1..=3usize {
            let neighbours = [
                (r.checked_sub(1), Some(c)),
                (Some(r + 1), Some(c)),
                (Some(r), c.checked_sub(1)),
                (Some(r), Some(c + 1)),
            ];
            for (nr, nc) in neighbours {
                let (Some(nr), Some(nc)) = (nr, nc) else {
                    continue;
                };
                if !(1..=3).contains(&nr) || !(1..=3).contains(&nc) {
                    continue;
                }
                let mut effects = vec![
                    format!("0 0 {} {}", agent_value(r, c), agent_value(nr, nc)),
                    "0 4 -1 1".to_string(),
                ];
                if !with_forced && (nr, nc) == (1, 2) {
                    effects.push("0 1 -1 1".to_string());
                }
                operators.push(format!(
                    "begin_operator\nmove a c_{}_{} c_{}_{}\n0\n{}\n{}\n1\nend_operator\n",
                    r,
                    c,
                    nr,
                    nc,
                    effects.len(),
                    effects.join("\n")
                ));
            }
        }
    }
    if with_forced {
        operators.push(format!(
            "begin_operator\nfa_collect a c_1_2\n1\n0 {}\n1\n0 1 0 1\n0\nend_operator\n",
            agent_value(1, 2)
        ));
        operators.push("begin_operator\n__forced__end-tick\n0\n1\n0 4 1 0\n0\nend_operator\n".to_string());
    }

    out.push_str(&format!("{}\n", operators.len()));
    for op in operators {
        out.push_str(&op);
    }
    out
}

/// Two forced operators that keep re-enabling each other.
pub const PING_PONG: &str = "\
begin_version
3
end_version
begin_metric
0
end_metric
1
begin_variable
var0
-1
2
Atom ping()
Atom pong()
end_variable
0
begin_state
0
end_state
begin_goal
0
end_goal
2
begin_operator
__forced__ping
0
1
0 0 0 1
0
end_operator
begin_operator
__forced__pong
0
1
0 0 1 0
0
end_operator
";
