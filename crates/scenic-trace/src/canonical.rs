//! Canonical assertion order.
//!
//! Raised events come first, ordered by port and event name, then state
//! assertions by instance, nesting depth and region, then variable
//! assertions by instance and variable name. A negated assertion sorts
//! right after the positive assertions with the same key. Sorting is
//! stable, so assertions with equal keys keep their relative order.

use std::collections::HashSet;

use scenic_model::{Assertion, ExecutionTrace, Step};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    rank: u8,
    primary: String,
    depth: usize,
    secondary: String,
    negated: bool,
}

fn sort_key(assertion: &Assertion) -> SortKey {
    match assertion {
        Assertion::RaiseEvent(act) => SortKey {
            rank: 0,
            primary: format!("{}{}", act.port, act.event),
            depth: 0,
            secondary: String::new(),
            negated: false,
        },
        Assertion::State(state) => SortKey {
            rank: 1,
            primary: state.instance.clone(),
            depth: state.depth,
            secondary: state.region.clone(),
            negated: false,
        },
        Assertion::Variable(var) => SortKey {
            rank: 2,
            primary: format!("{}{}", var.instance, var.variable),
            depth: 0,
            secondary: String::new(),
            negated: false,
        },
        Assertion::Negated(inner) => SortKey {
            negated: true,
            ..sort_key(inner)
        },
    }
}

/// Sort the assertions of `step` into canonical order and drop duplicates,
/// keeping the first occurrence.
pub fn canonicalize(step: &mut Step) {
    step.asserts.sort_by_cached_key(sort_key);
    let mut seen = HashSet::with_capacity(step.asserts.len());
    step.asserts.retain(|a| seen.insert(a.clone()));
}

/// Canonicalize every step of `trace`, including its cycle.
pub fn canonicalize_trace(trace: &mut ExecutionTrace) {
    for step in &mut trace.steps {
        canonicalize(step);
    }
    if let Some(cycle) = &mut trace.cycle {
        for step in cycle {
            canonicalize(step);
        }
    }
}
