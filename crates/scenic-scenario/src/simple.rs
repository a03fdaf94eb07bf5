//! Simple-form check.
//!
//! A scenario is simple when its chart consists of leaves, interaction sets
//! and alternatives only (plus loops, if allowed). Determinized scenarios are
//! simple; simple scenarios can be linearized with [`crate::enumerate_paths`].

use scenic_model::{FragmentKind, Interaction, InteractionFragment, ScenarioDefinition};

use crate::error::{Location, PathSegment, ScenarioError};

pub fn is_simple(scenario: &ScenarioDefinition, allow_loops: bool) -> bool {
    find_non_simple(&scenario.chart, allow_loops, &mut Vec::new()).is_none()
}

/// Report the first construct that keeps `scenario` from being simple.
pub fn check_simple(scenario: &ScenarioDefinition, allow_loops: bool) -> Result<(), ScenarioError> {
    match find_non_simple(&scenario.chart, allow_loops, &mut Vec::new()) {
        None => Ok(()),
        Some((construct, path)) => Err(ScenarioError::Unsupported {
            construct: format!("{construct} in a simple scenario"),
            location: Location::new(&scenario.name, path),
        }),
    }
}

fn find_non_simple(
    fragment: &InteractionFragment,
    allow_loops: bool,
    path: &mut Vec<PathSegment>,
) -> Option<(String, Vec<PathSegment>)> {
    for (i, interaction) in fragment.iter().enumerate() {
        path.push(PathSegment::Interaction(i));
        match interaction {
            Interaction::Leaf(_) | Interaction::Negated(_) | Interaction::Set(_) => {}
            Interaction::Reference(_) => return Some((interaction.kind_name(), path.clone())),
            Interaction::Fragment(cf) => {
                let allowed = match cf.kind {
                    FragmentKind::Alternative => true,
                    FragmentKind::Loop => allow_loops,
                    FragmentKind::Optional | FragmentKind::Parallel | FragmentKind::Unordered => {
                        false
                    }
                };
                if !allowed {
                    return Some((interaction.kind_name(), path.clone()));
                }
                for (k, sub) in cf.fragments.iter().enumerate() {
                    path.push(PathSegment::Fragment(k));
                    if let Some(found) = find_non_simple(sub, allow_loops, path) {
                        return Some(found);
                    }
                    path.pop();
                }
            }
        }
        path.pop();
    }
    None
}
