//! DOT rendering of a resolved suite.
//!
//! Each scenario becomes a node labelled with its signature; each recorded
//! dependency becomes an edge from the dependent to the scenario it needs.
//! Nodes are emitted in execution order so the output is stable.

use crate::suite::SuitePlan;

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Render `plan` as a Graphviz digraph.
#[must_use]
pub fn to_dot(plan: &SuitePlan) -> String {
    let mut out = String::from("digraph dependsload {\n  rankdir=LR;\n");
    for scenario in plan.scenarios() {
        let node = quote(scenario.signature().as_str());
        if scenario.dependencies().is_empty() {
            out.push_str(&format!("  {node};\n"));
        }
        for dep in scenario.dependencies() {
            out.push_str(&format!("  {node} -> {};\n", quote(dep.as_str())));
        }
    }
    out.push_str("}\n");
    out
}
