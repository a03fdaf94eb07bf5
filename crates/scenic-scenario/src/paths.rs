//! Linearization of determinized charts.

use tracing::debug;

use scenic_model::{FragmentKind, Interaction, InteractionFragment, ScenarioDefinition};

use crate::error::{Location, PathSegment, ScenarioError};
use crate::limits::ExpansionLimits;

/// Every interaction sequence obtained by choosing one branch at each
/// alternative of a determinized chart.
///
/// Paths come out in branch order: the first path takes the first branch
/// everywhere. Any fragment other than an alternative is unsupported, so
/// loops must have been unrolled. The number of paths is checked against
/// `limits.max_branches` before any path is built.
pub fn enumerate_paths(
    scenario: &ScenarioDefinition,
    limits: &ExpansionLimits,
) -> Result<Vec<InteractionFragment>, ScenarioError> {
    let mut path = Vec::new();
    let count = count_paths(&scenario.name, &scenario.chart, &mut path)?;
    limits.check_branches(
        "path enumeration",
        count.unwrap_or(u128::MAX),
        &Location::root(&scenario.name),
    )?;

    let paths: Vec<InteractionFragment> = expand(&scenario.chart)
        .into_iter()
        .map(InteractionFragment::new)
        .collect();
    debug!(scenario = %scenario.name, paths = paths.len(), "enumerated paths");
    Ok(paths)
}

/// Number of paths through `fragment`, `None` on overflow.
fn count_paths(
    scenario: &str,
    fragment: &InteractionFragment,
    path: &mut Vec<PathSegment>,
) -> Result<Option<u128>, ScenarioError> {
    let mut total = Some(1u128);
    for (i, interaction) in fragment.iter().enumerate() {
        path.push(PathSegment::Interaction(i));
        if let Interaction::Fragment(cf) = interaction {
            if cf.kind != FragmentKind::Alternative {
                return Err(ScenarioError::Unsupported {
                    construct: format!("{} fragment in a linear path", cf.kind),
                    location: Location::new(scenario, path.clone()),
                });
            }
            let mut branches = Some(0u128);
            for (k, branch) in cf.fragments.iter().enumerate() {
                path.push(PathSegment::Fragment(k));
                let n = count_paths(scenario, branch, path)?;
                branches = branches.zip(n).and_then(|(acc, n)| acc.checked_add(n));
                path.pop();
            }
            total = total.zip(branches).and_then(|(acc, n)| acc.checked_mul(n));
        } else if let Interaction::Reference(r) = interaction {
            return Err(ScenarioError::UnresolvedReference {
                target: r.target.clone(),
                location: Location::new(scenario, path.clone()),
            });
        }
        path.pop();
    }
    Ok(total)
}

fn expand(fragment: &InteractionFragment) -> Vec<Vec<Interaction>> {
    let mut prefixes = vec![Vec::new()];
    for interaction in fragment.iter() {
        match interaction {
            Interaction::Fragment(cf) => {
                let suffixes: Vec<Vec<Interaction>> =
                    cf.fragments.iter().flat_map(expand).collect();
                prefixes = prefixes
                    .into_iter()
                    .flat_map(|prefix| {
                        suffixes.iter().map(move |suffix| {
                            let mut joined = prefix.clone();
                            joined.extend(suffix.iter().cloned());
                            joined
                        })
                    })
                    .collect();
            }
            leaf => {
                for prefix in &mut prefixes {
                    prefix.push(leaf.clone());
                }
            }
        }
    }
    prefixes
}
