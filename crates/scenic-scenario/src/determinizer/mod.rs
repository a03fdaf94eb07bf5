//! Rewriting of nondeterministic interaction trees into alternatives over
//! flat sequences.
//!
//! One rule per combined-fragment kind:
//!
//! | Kind | Result |
//! |------|--------|
//! | `Alternative{B1..Bn}` | `Alternative` over the determinized branches |
//! | `Optional{F}` | `Alternative{[], F}` |
//! | `Loop{lo, hi, F}` | `lo` copies of `F`, then `Alternative` of `0..=hi-lo` further copies |
//! | `Unordered{F1..Fn}` | `Alternative` with one branch per permutation of the operands |
//! | `Parallel{F1..Fn}` | `Alternative` with one branch per interleaving of the operands |
//!
//! Leaves are copied with parameters and constants substituted. References
//! must have been inlined beforehand.

mod interleaving;
mod permutations;
mod substitution;

pub use interleaving::{interleavings, Origin};
pub use permutations::permutations;
pub use substitution::SubstitutionEnv;

use tracing::debug;

use scenic_model::{
    CombinedFragment, ConstantTable, Expression, FragmentKind, Interaction, InteractionFragment,
    ScenarioDefinition,
};

use crate::error::{Location, PathSegment, ScenarioError};
use crate::limits::{factorial, multinomial, ExpansionLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default, deny_unknown_fields))]
pub struct DeterminizeOptions {
    /// Expand loops into copies and alternatives. When false, loops are kept
    /// with their bodies determinized.
    pub unroll_loops: bool,
    pub limits: ExpansionLimits,
}

impl Default for DeterminizeOptions {
    fn default() -> Self {
        Self {
            unroll_loops: true,
            limits: ExpansionLimits::default(),
        }
    }
}

/// Determinize a reference-free scenario.
///
/// `arguments` bind the scenario's own parameters positionally. With `None`
/// unbound parameters are left symbolic; with `Some` every parameter that
/// occurs must be bound. Bindings recorded by reference resolution are
/// applied and then dropped from the result.
pub fn determinize(
    scenario: &ScenarioDefinition,
    constants: &ConstantTable,
    arguments: Option<&[Expression]>,
    options: &DeterminizeOptions,
) -> Result<ScenarioDefinition, ScenarioError> {
    let mut determinizer = Determinizer {
        scenario_name: &scenario.name,
        env: SubstitutionEnv::new(scenario, constants, arguments),
        options,
        path: Vec::new(),
        depth: 0,
        emitted: 0,
    };
    let chart = determinizer.fragment(&scenario.chart)?;

    let initial_block = match &scenario.initial_block {
        Some(block) => {
            let mut leaves = Vec::with_capacity(block.len());
            for (i, leaf) in block.iter().enumerate() {
                let location = Location::new(&scenario.name, vec![PathSegment::Initial(i)]);
                leaves.push(determinizer.env.leaf(leaf, &location)?);
            }
            Some(leaves)
        }
        None => None,
    };

    let root = Location::root(&scenario.name);
    let annotations = scenario
        .annotations
        .iter()
        .map(|a| determinizer.env.annotation(a, &root))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        scenario = %scenario.name,
        nodes_in = scenario.chart.node_count(),
        nodes_out = chart.node_count(),
        unroll_loops = options.unroll_loops,
        symbolic = determinizer.env.is_symbolic(),
        "determinized scenario"
    );

    Ok(ScenarioDefinition {
        name: scenario.name.clone(),
        parameters: scenario.parameters.clone(),
        initial_block,
        chart,
        annotations,
        bindings: Vec::new(),
    })
}

struct Determinizer<'a> {
    scenario_name: &'a str,
    env: SubstitutionEnv<'a>,
    options: &'a DeterminizeOptions,
    path: Vec<PathSegment>,
    depth: usize,
    /// Upper bound on interaction nodes emitted by expansions so far.
    emitted: u128,
}

impl Determinizer<'_> {
    fn location(&self) -> Location {
        Location::new(self.scenario_name, self.path.clone())
    }

    fn limits(&self) -> &ExpansionLimits {
        &self.options.limits
    }

    fn fragment(
        &mut self,
        fragment: &InteractionFragment,
    ) -> Result<InteractionFragment, ScenarioError> {
        let mut out = Vec::with_capacity(fragment.len());
        for (i, interaction) in fragment.iter().enumerate() {
            self.path.push(PathSegment::Interaction(i));
            self.interaction(interaction, &mut out)?;
            self.path.pop();
        }
        Ok(out.into())
    }

    /// Determinized operands of `cf`, in order.
    fn operands(&mut self, cf: &CombinedFragment) -> Result<Vec<InteractionFragment>, ScenarioError> {
        let mut operands = Vec::with_capacity(cf.fragments.len());
        for (k, operand) in cf.fragments.iter().enumerate() {
            self.path.push(PathSegment::Fragment(k));
            operands.push(self.fragment(operand)?);
            self.path.pop();
        }
        Ok(operands)
    }

    fn interaction(
        &mut self,
        interaction: &Interaction,
        out: &mut Vec<Interaction>,
    ) -> Result<(), ScenarioError> {
        let location = self.location();
        match interaction {
            Interaction::Leaf(leaf) => out.push(Interaction::Leaf(self.env.leaf(leaf, &location)?)),
            Interaction::Negated(leaf) => {
                out.push(Interaction::Negated(self.env.leaf(leaf, &location)?))
            }
            Interaction::Set(members) => {
                let mut substituted = Vec::with_capacity(members.len());
                for (m, member) in members.iter().enumerate() {
                    self.path.push(PathSegment::Member(m));
                    let member_location = self.location();
                    substituted.push(self.env.definition(member, &member_location)?);
                    self.path.pop();
                }
                out.push(Interaction::Set(substituted));
            }
            Interaction::Reference(reference) => {
                return Err(ScenarioError::UnresolvedReference {
                    target: reference.target.clone(),
                    location,
                });
            }
            Interaction::Fragment(cf) => {
                self.depth += 1;
                self.limits().check_depth(self.depth, &location)?;
                let result = self.combined(cf, &location, out);
                self.depth -= 1;
                result?;
            }
        }
        Ok(())
    }

    fn combined(
        &mut self,
        cf: &CombinedFragment,
        location: &Location,
        out: &mut Vec<Interaction>,
    ) -> Result<(), ScenarioError> {
        match cf.kind {
            FragmentKind::Alternative => {
                let branches = self.operands(cf)?;
                out.push(alternative(branches));
            }
            FragmentKind::Optional => {
                let [body] = cf.fragments.as_slice() else {
                    return Err(ScenarioError::Unsupported {
                        construct: format!("optional fragment with {} operands", cf.fragments.len()),
                        location: location.clone(),
                    });
                };
                self.path.push(PathSegment::Fragment(0));
                let body = self.fragment(body)?;
                self.path.pop();
                out.push(alternative(vec![InteractionFragment::empty(), body]));
            }
            FragmentKind::Loop => self.looped(cf, location, out)?,
            FragmentKind::Unordered => {
                let n = cf.fragments.len();
                let count = factorial(n);
                self.check_branches("unordered fragment", count, location)?;
                let operands = self.operands(cf)?;
                let per_branch: usize = operands.iter().map(InteractionFragment::node_count).sum();
                self.note_emitted(count.and_then(|c| c.checked_mul(per_branch as u128)), location)?;

                let branches: Vec<InteractionFragment> = permutations(n)
                    .into_iter()
                    .map(|order| {
                        order
                            .into_iter()
                            .flat_map(|k| operands[k].iter().cloned())
                            .collect()
                    })
                    .collect();
                debug!(%location, operands = n, branches = branches.len(), "expanded unordered fragment");
                out.push(alternative(branches));
            }
            FragmentKind::Parallel => {
                let operands = self.operands(cf)?;
                let lengths: Vec<usize> = operands.iter().map(InteractionFragment::len).collect();
                let count = multinomial(&lengths);
                self.check_branches("parallel fragment", count, location)?;
                let per_branch: usize = operands.iter().map(InteractionFragment::node_count).sum();
                self.note_emitted(count.and_then(|c| c.checked_mul(per_branch as u128)), location)?;

                let branches: Vec<InteractionFragment> = interleavings(&lengths)
                    .into_iter()
                    .map(|origins| {
                        origins
                            .into_iter()
                            .map(|(source, index)| operands[source].interactions[index].clone())
                            .collect()
                    })
                    .collect();
                debug!(%location, ?lengths, branches = branches.len(), "expanded parallel fragment");
                out.push(alternative(branches));
            }
        }
        Ok(())
    }

    fn looped(
        &mut self,
        cf: &CombinedFragment,
        location: &Location,
        out: &mut Vec<Interaction>,
    ) -> Result<(), ScenarioError> {
        let Some(bounds) = &cf.bounds else {
            return Err(ScenarioError::InvalidBound {
                reason: "loop fragment without bounds".to_string(),
                location: location.clone(),
            });
        };
        let [body] = cf.fragments.as_slice() else {
            return Err(ScenarioError::Unsupported {
                construct: format!("loop fragment with {} operands", cf.fragments.len()),
                location: location.clone(),
            });
        };

        let minimum = self.env.expression(&bounds.minimum, location)?;
        let maximum = bounds
            .maximum
            .as_ref()
            .map(|m| self.env.expression(m, location))
            .transpose()?;
        self.path.push(PathSegment::Fragment(0));
        let body = self.fragment(body)?;
        self.path.pop();

        if !self.options.unroll_loops {
            let constants = self.env.constants();
            if let Ok(lo) = minimum.evaluate_int(constants) {
                let hi = match &maximum {
                    Some(m) => m.evaluate_int(constants).ok(),
                    None => Some(lo),
                };
                if let Some(hi) = hi {
                    check_range(lo, hi, location)?;
                }
            }
            out.push(Interaction::Fragment(CombinedFragment::looped(
                minimum, maximum, body,
            )));
            return Ok(());
        }

        let lo = fold_bound(&minimum, self.env.constants(), location)?;
        let hi = match &maximum {
            Some(m) => fold_bound(m, self.env.constants(), location)?,
            None => lo,
        };
        check_range(lo, hi, location)?;

        // Both non-negative after the range check.
        let (lo, extra) = (lo as u128, (hi - lo) as u128);
        if extra > 0 {
            self.check_branches("loop fragment", Some(extra + 1), location)?;
        }
        let copies = extra
            .checked_mul(extra + 1)
            .map(|triangle| triangle / 2)
            .and_then(|optional| optional.checked_add(lo));
        let body_nodes = body.node_count() as u128;
        self.note_emitted(copies.and_then(|c| c.checked_mul(body_nodes)), location)?;

        if !body.is_empty() {
            for _ in 0..lo {
                out.extend(body.iter().cloned());
            }
        }
        if extra > 0 {
            let branches = (0..=extra)
                .map(|k| {
                    let mut branch = Vec::new();
                    if !body.is_empty() {
                        for _ in 0..k {
                            branch.extend(body.iter().cloned());
                        }
                    }
                    InteractionFragment::new(branch)
                })
                .collect();
            out.push(alternative(branches));
        }
        debug!(%location, mandatory = lo, optional = extra, "unrolled loop fragment");
        Ok(())
    }

    fn check_branches(
        &self,
        construct: &str,
        count: Option<u128>,
        location: &Location,
    ) -> Result<(), ScenarioError> {
        self.limits()
            .check_branches(construct, count.unwrap_or(u128::MAX), location)
    }

    /// Account for `nodes` more emitted nodes; `None` means the count
    /// overflowed.
    fn note_emitted(&mut self, nodes: Option<u128>, location: &Location) -> Result<(), ScenarioError> {
        self.emitted = nodes
            .and_then(|n| self.emitted.checked_add(n))
            .unwrap_or(u128::MAX);
        let emitted = usize::try_from(self.emitted).unwrap_or(usize::MAX);
        self.limits().check_nodes(emitted, location)
    }
}

fn alternative(branches: Vec<InteractionFragment>) -> Interaction {
    Interaction::Fragment(CombinedFragment::alternative(branches))
}

fn fold_bound(
    expr: &Expression,
    constants: &ConstantTable,
    location: &Location,
) -> Result<i64, ScenarioError> {
    expr.evaluate_int(constants)
        .map_err(|source| ScenarioError::NonConstantBound {
            location: location.clone(),
            source,
        })
}

fn check_range(lo: i64, hi: i64, location: &Location) -> Result<(), ScenarioError> {
    if lo < 0 {
        return Err(ScenarioError::InvalidBound {
            reason: format!("negative minimum {lo}"),
            location: location.clone(),
        });
    }
    if hi < lo {
        return Err(ScenarioError::InvalidBound {
            reason: format!("maximum {hi} is below minimum {lo}"),
            location: location.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use scenic_model::{
        Annotation, BinaryOp, Leaf, ParameterBinding, ParameterDeclaration, Signal,
    };

    fn send(e: &str) -> Interaction {
        Interaction::send("p", e)
    }

    fn frag(interactions: Vec<Interaction>) -> InteractionFragment {
        interactions.into()
    }

    fn scenario(chart: Vec<Interaction>) -> ScenarioDefinition {
        ScenarioDefinition::new("S", chart.into())
    }

    fn run(scenario: &ScenarioDefinition) -> Result<ScenarioDefinition, ScenarioError> {
        determinize(
            scenario,
            &ConstantTable::new(),
            None,
            &DeterminizeOptions::default(),
        )
    }

    fn branches_of(interaction: &Interaction) -> &[InteractionFragment] {
        match interaction {
            Interaction::Fragment(cf) if cf.kind == FragmentKind::Alternative => &cf.fragments,
            other => panic!("expected alternative, got {other:?}"),
        }
    }

    // --- loops ---

    #[test]
    fn loop_one_to_three_unrolls_into_mandatory_copy_and_alternative() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::int(1),
            Some(Expression::int(3)),
            frag(vec![send("x")]),
        ))]);
        let out = run(&s).expect("determinize");
        assert_eq!(out.chart.len(), 2);
        assert_eq!(out.chart.interactions[0], send("x"));
        assert_eq!(
            branches_of(&out.chart.interactions[1]),
            &[
                frag(vec![]),
                frag(vec![send("x")]),
                frag(vec![send("x"), send("x")]),
            ]
        );
    }

    #[test]
    fn loop_with_equal_bounds_has_no_alternative() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::int(2),
            None,
            frag(vec![send("x"), send("y")]),
        ))]);
        let out = run(&s).expect("determinize");
        assert_eq!(out.chart, frag(vec![send("x"), send("y"), send("x"), send("y")]));
    }

    #[test]
    fn inverted_loop_bounds_are_rejected() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::int(3),
            Some(Expression::int(1)),
            frag(vec![send("x")]),
        ))]);
        let err = run(&s).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBound);
        assert_eq!(err.location().to_string(), "S:chart[0]");
    }

    #[test]
    fn negative_loop_minimum_is_rejected() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::int(-1),
            Some(Expression::int(1)),
            frag(vec![send("x")]),
        ))]);
        assert!(matches!(run(&s), Err(ScenarioError::InvalidBound { .. })));
    }

    #[test]
    fn symbolic_loop_bound_is_not_constant_when_unrolling() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::parameter("S", 0, "n"),
            None,
            frag(vec![send("x")]),
        ))])
        .with_parameters(vec![ParameterDeclaration::integer("n")]);
        let err = run(&s).unwrap_err();
        assert!(matches!(err, ScenarioError::NonConstantBound { .. }));
    }

    #[test]
    fn loop_bound_from_argument_and_constant() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::parameter("S", 0, "n"),
            Some(Expression::binary(
                BinaryOp::Add,
                Expression::parameter("S", 0, "n"),
                Expression::constant("EXTRA"),
            )),
            frag(vec![send("x")]),
        ))])
        .with_parameters(vec![ParameterDeclaration::integer("n")]);
        let mut constants = ConstantTable::new();
        constants.insert("EXTRA".into(), Expression::int(1));
        let args = [Expression::int(2)];
        let out = determinize(&s, &constants, Some(&args[..]), &DeterminizeOptions::default())
            .expect("determinize");
        assert_eq!(out.chart.len(), 3);
        assert_eq!(branches_of(&out.chart.interactions[2]).len(), 2);
    }

    #[test]
    fn loops_are_kept_when_not_unrolling() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::constant("N"),
            None,
            frag(vec![Interaction::Fragment(CombinedFragment::optional(frag(vec![send("x")])))]),
        ))]);
        let mut constants = ConstantTable::new();
        constants.insert("N".into(), Expression::int(4));
        let options = DeterminizeOptions {
            unroll_loops: false,
            ..DeterminizeOptions::default()
        };
        let out = determinize(&s, &constants, None, &options).expect("determinize");
        let Interaction::Fragment(lp) = &out.chart.interactions[0] else {
            panic!("expected loop");
        };
        assert_eq!(lp.kind, FragmentKind::Loop);
        assert_eq!(lp.bounds.as_ref().map(|b| &b.minimum), Some(&Expression::int(4)));
        assert_eq!(branches_of(&lp.fragments[0].interactions[0]).len(), 2);
    }

    // --- optional, unordered, parallel ---

    #[test]
    fn optional_becomes_empty_first_alternative() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::optional(frag(vec![
            send("a"),
        ])))]);
        let out = run(&s).expect("determinize");
        assert_eq!(
            branches_of(&out.chart.interactions[0]),
            &[frag(vec![]), frag(vec![send("a")])]
        );
    }

    #[test]
    fn unordered_permutes_whole_operands() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::unordered(vec![
            frag(vec![send("a"), send("b")]),
            frag(vec![send("c")]),
        ]))]);
        let out = run(&s).expect("determinize");
        assert_eq!(
            branches_of(&out.chart.interactions[0]),
            &[
                frag(vec![send("a"), send("b"), send("c")]),
                frag(vec![send("c"), send("a"), send("b")]),
            ]
        );
    }

    #[test]
    fn parallel_two_and_one_yields_three_interleavings() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::parallel(vec![
            frag(vec![send("a"), send("b")]),
            frag(vec![send("c")]),
        ]))]);
        let out = run(&s).expect("determinize");
        assert_eq!(
            branches_of(&out.chart.interactions[0]),
            &[
                frag(vec![send("a"), send("b"), send("c")]),
                frag(vec![send("a"), send("c"), send("b")]),
                frag(vec![send("c"), send("a"), send("b")]),
            ]
        );
    }

    #[test]
    fn parallel_with_empty_operand_is_identity() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::parallel(vec![
            frag(vec![send("a")]),
            frag(vec![]),
        ]))]);
        let out = run(&s).expect("determinize");
        assert_eq!(branches_of(&out.chart.interactions[0]), &[frag(vec![send("a")])]);
    }

    #[test]
    fn parallel_over_the_branch_limit_is_a_resource_error() {
        let operand = || frag((0..5).map(|i| send(&format!("e{i}"))).collect());
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::parallel(vec![
            operand(),
            operand(),
        ]))]);
        let options = DeterminizeOptions {
            limits: ExpansionLimits {
                max_branches: 251,
                ..ExpansionLimits::default()
            },
            ..DeterminizeOptions::default()
        };
        let err = determinize(&s, &ConstantTable::new(), None, &options).unwrap_err();
        assert!(err.is_resource_limit());
        match err {
            ScenarioError::BranchLimitExceeded { required, .. } => assert_eq!(required, 252),
            other => panic!("expected BranchLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn nesting_deeper_than_the_limit_fails() {
        let mut chart = frag(vec![send("a")]);
        for _ in 0..5 {
            chart = frag(vec![Interaction::Fragment(CombinedFragment::alternative(vec![chart]))]);
        }
        let options = DeterminizeOptions {
            limits: ExpansionLimits {
                max_depth: 4,
                ..ExpansionLimits::default()
            },
            ..DeterminizeOptions::default()
        };
        let err = determinize(&ScenarioDefinition::new("S", chart), &ConstantTable::new(), None, &options)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::DepthLimitExceeded { depth: 5, limit: 4, .. }));
    }

    #[test]
    fn loop_node_estimate_is_checked_before_copying() {
        let s = scenario(vec![Interaction::Fragment(CombinedFragment::looped(
            Expression::int(1_000_000_000),
            None,
            frag(vec![send("x")]),
        ))]);
        let err = run(&s).unwrap_err();
        assert!(matches!(err, ScenarioError::NodeLimitExceeded { .. }));
    }

    // --- leaves, initial block, annotations ---

    #[test]
    fn references_must_be_resolved_first() {
        let s = scenario(vec![Interaction::reference("Other", vec![])]);
        let err = run(&s).unwrap_err();
        assert!(matches!(err, ScenarioError::UnresolvedReference { .. }));
    }

    #[test]
    fn signal_arguments_and_set_members_are_substituted() {
        let signal = Leaf::Signal(Signal {
            arguments: vec![Expression::parameter("Callee", 0, "v")],
            ..match Leaf::send("p", "a") {
                Leaf::Signal(s) => s,
                _ => unreachable!(),
            }
        });
        let mut s = scenario(vec![
            Interaction::Leaf(signal.clone()),
            Interaction::Set(vec![scenic_model::InteractionDefinition::Negated(signal)]),
        ]);
        s.bindings.push(ParameterBinding {
            scenario: "Callee".into(),
            index: 0,
            value: Expression::int(9),
        });
        let out = run(&s).expect("determinize");
        assert!(out.bindings.is_empty());
        let Interaction::Leaf(Leaf::Signal(sig)) = &out.chart.interactions[0] else {
            panic!("expected signal");
        };
        assert_eq!(sig.arguments, vec![Expression::int(9)]);
        let Interaction::Set(members) = &out.chart.interactions[1] else {
            panic!("expected set");
        };
        assert!(matches!(
            &members[0],
            scenic_model::InteractionDefinition::Negated(Leaf::Signal(s)) if s.arguments == vec![Expression::int(9)]
        ));
    }

    #[test]
    fn initial_block_and_wait_bounds_are_substituted() {
        let mut s = scenario(vec![send("a")]).with_parameters(vec![ParameterDeclaration::integer("t")]);
        s.initial_block = Some(vec![Leaf::delay(Expression::parameter("S", 0, "t"), None)]);
        s.annotations.push(Annotation::WaitBound {
            minimum: Expression::int(0),
            maximum: Expression::parameter("S", 0, "t"),
        });
        let args = [Expression::int(5)];
        let out = determinize(&s, &ConstantTable::new(), Some(&args[..]), &DeterminizeOptions::default())
            .expect("determinize");
        assert_eq!(
            out.initial_block,
            Some(vec![Leaf::delay(Expression::int(5), None)])
        );
        assert_eq!(
            out.annotations,
            vec![Annotation::WaitBound {
                minimum: Expression::int(0),
                maximum: Expression::int(5),
            }]
        );
    }

    #[test]
    fn missing_argument_in_initial_block_names_its_location() {
        let mut s = scenario(vec![]).with_parameters(vec![ParameterDeclaration::integer("t")]);
        s.initial_block = Some(vec![
            Leaf::reset(),
            Leaf::delay(Expression::parameter("S", 0, "t"), None),
        ]);
        let err = determinize(&s, &ConstantTable::new(), Some(&[] as &[Expression]), &DeterminizeOptions::default())
            .unwrap_err();
        assert_eq!(err.location().to_string(), "S:initial[1]");
    }
}
