//! Lifting of optionals and nested alternatives into the branches of their
//! enclosing alternative.

use scenic_model::{CombinedFragment, FragmentKind, Interaction, InteractionFragment, ScenarioDefinition};

use crate::error::{Location, PathSegment, ScenarioError};

/// Rewrite every alternative so that an optional or alternative sitting
/// directly in one of its branches becomes sibling branches instead.
///
/// For a branch `B` whose interaction `i` is `Optional{F}`, the branch is
/// replaced by `B[i := F]` followed by `B[i := ε]`. For `Alternative{B1..Bn}`
/// it is replaced by `B[i := B1] .. B[i := Bn]`. Nested fragments are
/// rewritten before their parents.
///
/// One call lifts only the first such interaction of each branch, so a
/// branch grows into at most as many branches as the lifted fragment has.
/// Later optionals and alternatives of the same branch stay in place; call
/// `distribute` again to lift the next one. The determinizer expands
/// whatever is left either way.
pub fn distribute(scenario: &ScenarioDefinition) -> Result<ScenarioDefinition, ScenarioError> {
    let mut distributor = Distributor {
        scenario_name: &scenario.name,
        path: Vec::new(),
    };
    let chart = distributor.fragment(&scenario.chart)?;
    Ok(ScenarioDefinition {
        chart,
        ..scenario.clone()
    })
}

struct Distributor<'a> {
    scenario_name: &'a str,
    path: Vec<PathSegment>,
}

impl Distributor<'_> {
    fn location(&self) -> Location {
        Location::new(self.scenario_name, self.path.clone())
    }

    fn fragment(&mut self, fragment: &InteractionFragment) -> Result<InteractionFragment, ScenarioError> {
        let mut out = Vec::with_capacity(fragment.len());
        for (i, interaction) in fragment.iter().enumerate() {
            self.path.push(PathSegment::Interaction(i));
            let rewritten = match interaction {
                Interaction::Fragment(cf) => Interaction::Fragment(self.combined(cf)?),
                other => other.clone(),
            };
            out.push(rewritten);
            self.path.pop();
        }
        Ok(out.into())
    }

    fn combined(&mut self, cf: &CombinedFragment) -> Result<CombinedFragment, ScenarioError> {
        let mut fragments = Vec::with_capacity(cf.fragments.len());
        for (k, sub) in cf.fragments.iter().enumerate() {
            self.path.push(PathSegment::Fragment(k));
            fragments.push(self.fragment(sub)?);
            self.path.pop();
        }

        if cf.kind == FragmentKind::Alternative {
            let mut branches = Vec::with_capacity(fragments.len());
            for (k, branch) in fragments.into_iter().enumerate() {
                self.path.push(PathSegment::Fragment(k));
                branches.extend(self.split_branch(branch)?);
                self.path.pop();
            }
            fragments = branches;
        }

        Ok(CombinedFragment {
            kind: cf.kind,
            fragments,
            bounds: cf.bounds.clone(),
        })
    }

    fn split_branch(
        &mut self,
        branch: InteractionFragment,
    ) -> Result<Vec<InteractionFragment>, ScenarioError> {
        let nested = branch.iter().enumerate().find_map(|(i, interaction)| match interaction {
            Interaction::Fragment(cf)
                if matches!(cf.kind, FragmentKind::Optional | FragmentKind::Alternative) =>
            {
                Some((i, cf))
            }
            _ => None,
        });
        let Some((position, nested)) = nested else {
            return Ok(vec![branch]);
        };

        match nested.kind {
            FragmentKind::Optional => {
                let [body] = nested.fragments.as_slice() else {
                    self.path.push(PathSegment::Interaction(position));
                    let location = self.location();
                    return Err(ScenarioError::Unsupported {
                        construct: format!(
                            "optional fragment with {} operands",
                            nested.fragments.len()
                        ),
                        location,
                    });
                };
                Ok(vec![
                    splice(&branch, position, body),
                    splice(&branch, position, &InteractionFragment::empty()),
                ])
            }
            _ => Ok(nested
                .fragments
                .iter()
                .map(|alternative| splice(&branch, position, alternative))
                .collect()),
        }
    }
}

/// Copy of `branch` with the interaction at `position` replaced by the
/// interactions of `replacement`.
fn splice(
    branch: &InteractionFragment,
    position: usize,
    replacement: &InteractionFragment,
) -> InteractionFragment {
    let mut out = Vec::with_capacity(branch.len() + replacement.len());
    out.extend(branch.interactions[..position].iter().cloned());
    out.extend(replacement.iter().cloned());
    out.extend(branch.interactions[position + 1..].iter().cloned());
    out.into()
}
