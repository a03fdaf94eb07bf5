//! Coverage between traces and reduction to an antichain.
//!
//! A step list `a` is covered by `b` when `b` is at least as long and every
//! step of `a` performs the same actions as the step of `b` at the same
//! index. Under deterministic drivers `b` then observes everything `a` does,
//! and `a` is redundant.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use tracing::debug;

use scenic_model::{Assertion, ExecutionTrace, Step};

/// Which per-step comparison decides coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum CoverageRelation {
    /// Equal action multisets, see [`is_covered`].
    #[default]
    Actions,
    /// Equal state assertions, see [`is_covered_by_states`].
    States,
}

impl CoverageRelation {
    pub fn covers(self, smaller: &[Step], larger: &[Step]) -> bool {
        match self {
            CoverageRelation::Actions => is_covered(smaller, larger),
            CoverageRelation::States => is_covered_by_states(smaller, larger),
        }
    }
}

fn same_multiset<'a, T, I>(a: I, b: I) -> bool
where
    T: Eq + Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: HashMap<&T, isize> = HashMap::new();
    for item in a {
        *counts.entry(item).or_insert(0) += 1;
    }
    for item in b {
        *counts.entry(item).or_insert(0) -= 1;
    }
    counts.values().all(|&c| c == 0)
}

/// True if `smaller` is covered by `larger`.
pub fn is_covered(smaller: &[Step], larger: &[Step]) -> bool {
    larger.len() >= smaller.len()
        && smaller
            .iter()
            .zip(larger)
            .all(|(s, l)| same_multiset(&s.actions, &l.actions))
}

/// Like [`is_covered`], but compares the state assertions of each step and
/// ignores actions, events and variables.
pub fn is_covered_by_states(smaller: &[Step], larger: &[Step]) -> bool {
    larger.len() >= smaller.len()
        && smaller.iter().zip(larger).all(|(s, l)| {
            same_multiset(
                s.asserts.iter().filter_map(Assertion::as_state),
                l.asserts.iter().filter_map(Assertion::as_state),
            )
        })
}

/// Index ranges of the reset partitions of `steps`: a new partition starts
/// at every step that performs a reset. Empty partitions are skipped, so the
/// ranges are contiguous and cover `steps` exactly.
pub fn partition_ranges(steps: &[Step]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, step) in steps.iter().enumerate() {
        if step.has_reset() && i > start {
            ranges.push(start..i);
            start = i;
        }
    }
    if start < steps.len() {
        ranges.push(start..steps.len());
    }
    ranges
}

/// The steps of `trace` split at resets. Concatenating the partitions gives
/// back `trace.steps`.
pub fn partition_by_reset(trace: &ExecutionTrace) -> Vec<Vec<Step>> {
    partition_ranges(&trace.steps)
        .into_iter()
        .map(|range| trace.steps[range].to_vec())
        .collect()
}

/// [`reduce_to_antichain_with`] under [`CoverageRelation::Actions`].
pub fn reduce_to_antichain(traces: Vec<ExecutionTrace>) -> Vec<ExecutionTrace> {
    reduce_to_antichain_with(traces, CoverageRelation::Actions)
}

#[derive(Debug)]
struct Partition {
    trace: usize,
    range: Range<usize>,
    /// Partitions of cyclic traces are never removed.
    pinned: bool,
}

fn partition_steps<'t>(traces: &'t [ExecutionTrace], partition: &Partition) -> &'t [Step] {
    &traces[partition.trace].steps[partition.range.clone()]
}

/// Remove every reset partition covered by another partition, from any
/// trace, and drop traces that lose all their partitions.
///
/// When two partitions cover each other the later one goes. Traces without
/// steps pass through unchanged.
///
/// The result is an antichain only over acyclic traces. Partitions of
/// cyclic traces may cover others but are never removed themselves, so a
/// cyclic partition survives next to a longer partition that covers it, and
/// two equal cyclic partitions both survive.
pub fn reduce_to_antichain_with(
    traces: Vec<ExecutionTrace>,
    relation: CoverageRelation,
) -> Vec<ExecutionTrace> {
    let mut partitions: Vec<Partition> = traces
        .iter()
        .enumerate()
        .flat_map(|(t, trace)| {
            let pinned = trace.is_cyclic();
            partition_ranges(&trace.steps)
                .into_iter()
                .map(move |range| Partition {
                    trace: t,
                    range,
                    pinned,
                })
        })
        .collect();
    let initial = partitions.len();

    let mut i = 0;
    while i < partitions.len() {
        let mut j = i + 1;
        let mut removed_pivot = false;
        while j < partitions.len() {
            let a = partition_steps(&traces, &partitions[i]);
            let b = partition_steps(&traces, &partitions[j]);
            if !partitions[j].pinned && relation.covers(b, a) {
                partitions.remove(j);
            } else if !partitions[i].pinned && relation.covers(a, b) {
                partitions.remove(i);
                removed_pivot = true;
                break;
            } else {
                j += 1;
            }
        }
        if !removed_pivot {
            i += 1;
        }
    }

    debug!(
        traces = traces.len(),
        partitions = initial,
        removed = initial - partitions.len(),
        "reduced traces to antichain"
    );

    let mut kept: Vec<Vec<Range<usize>>> = vec![Vec::new(); traces.len()];
    for partition in partitions {
        kept[partition.trace].push(partition.range);
    }
    traces
        .into_iter()
        .zip(kept)
        .filter_map(|(trace, ranges)| {
            if trace.steps.is_empty() {
                return Some(trace);
            }
            if ranges.is_empty() {
                return None;
            }
            let steps = ranges
                .into_iter()
                .flat_map(|range| trace.steps[range].to_vec())
                .collect();
            Some(ExecutionTrace { steps, ..trace })
        })
        .collect()
}
