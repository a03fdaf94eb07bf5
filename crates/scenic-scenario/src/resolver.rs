//! Inlining of scenario references.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use scenic_model::{
    Expression, Interaction, InteractionDefinition, InteractionFragment, Leaf, ParameterBinding,
    ScenarioDefinition, ScenarioPackage, ScenarioReference,
};

use crate::error::{Location, PathSegment, ScenarioError};
use crate::limits::ExpansionLimits;

/// Replace every scenario reference in `scenario` with a copy of the target's
/// chart, repeating until no reference is left.
///
/// Arguments are not substituted here. Each inlined copy of a parameterized
/// target gets its own instance name (`Callee#1`, `Callee#2`, ...): the
/// parameter references inside the copy are renamed to it and the reference's
/// arguments are recorded under it in [`ScenarioDefinition::bindings`] for the
/// determinizer. Two references to the same target may therefore pass
/// different arguments.
///
/// Cycles in the reference graph are reported as
/// [`ScenarioError::ReferenceCycle`] before anything is inlined, so the node
/// limit only ever applies to acyclic growth.
pub fn resolve_references(
    scenario: &ScenarioDefinition,
    package: &ScenarioPackage,
    limits: &ExpansionLimits,
) -> Result<ScenarioDefinition, ScenarioError> {
    find_cycle(scenario, package)?;

    let mut resolved = scenario.clone();
    let mut instances = HashMap::new();
    let mut passes = 0;

    // Terminates: the reference graph is acyclic, so every pass inlines one
    // more level of it.
    while resolved.chart.contains_reference() {
        let mut pass = ResolvePass {
            package,
            scenario_name: &scenario.name,
            bindings: &mut resolved.bindings,
            instances: &mut instances,
            path: Vec::new(),
            inlined: 0,
        };
        let chart = pass.fragment(&resolved.chart)?;
        let inlined = pass.inlined;
        resolved.chart = chart;
        passes += 1;

        let nodes = resolved.chart.node_count();
        debug!(
            scenario = %scenario.name,
            pass = passes,
            inlined,
            nodes,
            "resolved scenario references"
        );
        limits.check_nodes(nodes, &Location::root(&scenario.name))?;
    }

    Ok(resolved)
}

struct ResolvePass<'a> {
    package: &'a ScenarioPackage,
    scenario_name: &'a str,
    bindings: &'a mut Vec<ParameterBinding>,
    /// Copies inlined so far, per target.
    instances: &'a mut HashMap<String, usize>,
    path: Vec<PathSegment>,
    inlined: usize,
}

impl ResolvePass<'_> {
    fn location(&self) -> Location {
        Location::new(self.scenario_name, self.path.clone())
    }

    fn fragment(
        &mut self,
        fragment: &InteractionFragment,
    ) -> Result<InteractionFragment, ScenarioError> {
        let mut out = Vec::with_capacity(fragment.len());
        for (i, interaction) in fragment.iter().enumerate() {
            self.path.push(PathSegment::Interaction(i));
            match interaction {
                Interaction::Reference(reference) => {
                    let chart = self.inline(reference)?;
                    out.extend(chart.interactions);
                }
                Interaction::Fragment(cf) => {
                    let mut rewritten = cf.clone();
                    for (k, sub) in cf.fragments.iter().enumerate() {
                        self.path.push(PathSegment::Fragment(k));
                        rewritten.fragments[k] = self.fragment(sub)?;
                        self.path.pop();
                    }
                    out.push(Interaction::Fragment(rewritten));
                }
                other => out.push(other.clone()),
            }
            self.path.pop();
        }
        Ok(out.into())
    }

    /// A fresh copy of the target's chart, with the reference's arguments
    /// bound to a new instance of the target.
    fn inline(
        &mut self,
        reference: &ScenarioReference,
    ) -> Result<InteractionFragment, ScenarioError> {
        let package = self.package;
        let target = package
            .scenario(&reference.target)
            .ok_or_else(|| ScenarioError::UnknownScenario {
                target: reference.target.clone(),
                location: self.location(),
            })?;

        if reference.arguments.len() != target.parameters.len() {
            return Err(ScenarioError::ArgumentCountMismatch {
                target: reference.target.clone(),
                given: reference.arguments.len(),
                expected: target.parameters.len(),
                location: self.location(),
            });
        }

        self.inlined += 1;
        let mut chart = target.chart.clone();
        if target.parameters.is_empty() {
            return Ok(chart);
        }

        let instance = self.next_instance(&target.name);
        rename_fragment(&mut chart, &target.name, &instance);
        self.bindings.extend(
            reference
                .arguments
                .iter()
                .enumerate()
                .map(|(index, argument)| ParameterBinding {
                    scenario: instance.clone(),
                    index,
                    value: argument.clone(),
                }),
        );
        Ok(chart)
    }

    /// Next `target#n` with no bindings yet.
    fn next_instance(&mut self, target: &str) -> String {
        let count = self.instances.entry(target.to_string()).or_insert(0);
        loop {
            *count += 1;
            let instance = format!("{target}#{count}");
            if !self.bindings.iter().any(|b| b.scenario == instance) {
                return instance;
            }
        }
    }
}

fn rename_fragment(fragment: &mut InteractionFragment, from: &str, to: &str) {
    for interaction in &mut fragment.interactions {
        match interaction {
            Interaction::Leaf(leaf) | Interaction::Negated(leaf) => rename_leaf(leaf, from, to),
            Interaction::Set(members) => {
                for member in members {
                    let (InteractionDefinition::Leaf(leaf) | InteractionDefinition::Negated(leaf)) =
                        member;
                    rename_leaf(leaf, from, to);
                }
            }
            Interaction::Fragment(cf) => {
                if let Some(bounds) = &mut cf.bounds {
                    rename_expression(&mut bounds.minimum, from, to);
                    if let Some(maximum) = &mut bounds.maximum {
                        rename_expression(maximum, from, to);
                    }
                }
                for sub in &mut cf.fragments {
                    rename_fragment(sub, from, to);
                }
            }
            Interaction::Reference(reference) => {
                for argument in &mut reference.arguments {
                    rename_expression(argument, from, to);
                }
            }
        }
    }
}

fn rename_leaf(leaf: &mut Leaf, from: &str, to: &str) {
    match leaf {
        Leaf::Signal(signal) => {
            for argument in &mut signal.arguments {
                rename_expression(argument, from, to);
            }
        }
        Leaf::Delay(delay) => {
            rename_expression(&mut delay.minimum, from, to);
            if let Some(maximum) = &mut delay.maximum {
                rename_expression(maximum, from, to);
            }
        }
        Leaf::Reset(_) => {}
    }
}

fn rename_expression(expr: &mut Expression, from: &str, to: &str) {
    match expr {
        Expression::Parameter(param) if param.scenario == from => param.scenario = to.to_string(),
        Expression::Unary { operand, .. } => rename_expression(operand, from, to),
        Expression::Binary { lhs, rhs, .. } => {
            rename_expression(lhs, from, to);
            rename_expression(rhs, from, to);
        }
        _ => {}
    }
}

/// Depth-first search of the reference graph reachable from `scenario`.
fn find_cycle(
    scenario: &ScenarioDefinition,
    package: &ScenarioPackage,
) -> Result<(), ScenarioError> {
    let mut search = CycleSearch {
        package,
        stack: Vec::new(),
        done: HashSet::new(),
    };
    search.visit(&scenario.name, &scenario.chart)
}

struct CycleSearch<'a> {
    package: &'a ScenarioPackage,
    /// Scenarios whose references are being followed.
    stack: Vec<&'a str>,
    done: HashSet<&'a str>,
}

impl<'a> CycleSearch<'a> {
    fn visit(
        &mut self,
        name: &'a str,
        chart: &'a InteractionFragment,
    ) -> Result<(), ScenarioError> {
        self.stack.push(name);
        let mut references = Vec::new();
        collect_references(chart, &mut Vec::new(), &mut references);

        for (target, path) in references {
            if let Some(start) = self.stack.iter().position(|s| *s == target) {
                let mut cycle = self.stack[start..].to_vec();
                cycle.push(target);
                return Err(ScenarioError::ReferenceCycle {
                    target: target.to_string(),
                    cycle: cycle.join(" -> "),
                    location: Location::new(name, path),
                });
            }
            if self.done.contains(target) {
                continue;
            }
            // Unknown targets are reported by the inlining pass.
            if let Some(next) = self.package.scenario(target) {
                self.visit(&next.name, &next.chart)?;
            }
        }

        self.stack.pop();
        self.done.insert(name);
        Ok(())
    }
}

/// Every reference in `fragment` with its path, in document order.
fn collect_references<'a>(
    fragment: &'a InteractionFragment,
    path: &mut Vec<PathSegment>,
    out: &mut Vec<(&'a str, Vec<PathSegment>)>,
) {
    for (i, interaction) in fragment.iter().enumerate() {
        path.push(PathSegment::Interaction(i));
        match interaction {
            Interaction::Reference(r) => out.push((r.target.as_str(), path.clone())),
            Interaction::Fragment(cf) => {
                for (k, sub) in cf.fragments.iter().enumerate() {
                    path.push(PathSegment::Fragment(k));
                    collect_references(sub, path, out);
                    path.pop();
                }
            }
            _ => {}
        }
        path.pop();
    }
}
