//! Proptest strategies for generating well-formed scenarios and traces.

use proptest::prelude::*;

use crate::expression::Expression;
use crate::interaction::{
    CombinedFragment, Interaction, InteractionDefinition, InteractionFragment, Leaf,
};
use crate::scenario::ScenarioDefinition;
use crate::trace::{
    Act, Assertion, ExecutionTrace, RaiseEventAct, StateAssertion, Step, VariableAssertion,
};

fn arb_port() -> impl Strategy<Value = String> {
    prop_oneof![Just("p".to_string()), Just("q".to_string())]
}

fn arb_event() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        Just("c".to_string())
    ]
}

/// Signals over a small port/event alphabet, plus delays and resets.
pub fn arb_leaf() -> impl Strategy<Value = Leaf> {
    prop_oneof![
        6 => (any::<bool>(), arb_port(), arb_event()).prop_map(|(send, port, event)| {
            if send {
                Leaf::send(port, event)
            } else {
                Leaf::receive(port, event)
            }
        }),
        1 => (0i64..=5).prop_map(|min| Leaf::delay(Expression::int(min), None)),
        1 => Just(Leaf::reset()),
    ]
}

/// Leaf-only interactions: leaves, negated leaves and interaction sets.
pub fn arb_leaf_interaction() -> impl Strategy<Value = Interaction> {
    prop_oneof![
        6 => arb_leaf().prop_map(Interaction::Leaf),
        1 => arb_leaf().prop_map(Interaction::Negated),
        1 => proptest::collection::vec(
            prop_oneof![
                arb_leaf().prop_map(InteractionDefinition::Leaf),
                arb_leaf().prop_map(InteractionDefinition::Negated),
            ],
            1..=3,
        )
        .prop_map(Interaction::Set),
    ]
}

/// Interaction trees with every combined-fragment kind.
///
/// Sizes are kept small (at most 3 sub-fragments of at most 2 interactions,
/// nesting depth 3, loop bounds within `0..=4`) so that full expansion stays
/// well under the default expansion limits in the common case.
pub fn arb_interaction() -> impl Strategy<Value = Interaction> {
    arb_leaf_interaction().prop_recursive(3, 24, 3, |inner| {
        let fragment = proptest::collection::vec(inner, 0..=2)
            .prop_map(InteractionFragment::new)
            .boxed();
        let branches = proptest::collection::vec(fragment.clone(), 1..=3).boxed();
        prop_oneof![
            branches
                .clone()
                .prop_map(|b| Interaction::Fragment(CombinedFragment::alternative(b))),
            fragment
                .clone()
                .prop_map(|f| Interaction::Fragment(CombinedFragment::optional(f))),
            branches
                .clone()
                .prop_map(|b| Interaction::Fragment(CombinedFragment::parallel(b))),
            branches.prop_map(|b| Interaction::Fragment(CombinedFragment::unordered(b))),
            (0i64..=2, 0i64..=2, fragment).prop_map(|(lo, extra, body)| {
                Interaction::Fragment(CombinedFragment::looped(
                    Expression::int(lo),
                    Some(Expression::int(lo + extra)),
                    body,
                ))
            }),
        ]
    })
}

pub fn arb_fragment() -> impl Strategy<Value = InteractionFragment> {
    proptest::collection::vec(arb_interaction(), 0..=3).prop_map(InteractionFragment::new)
}

/// A parameterless, reference-free scenario.
pub fn arb_scenario() -> impl Strategy<Value = ScenarioDefinition> {
    arb_fragment().prop_map(|chart| ScenarioDefinition::new("Generated", chart))
}

fn arb_raise() -> impl Strategy<Value = RaiseEventAct> {
    (arb_port(), arb_event()).prop_map(|(port, event)| RaiseEventAct::new(port, event))
}

pub fn arb_act() -> impl Strategy<Value = Act> {
    prop_oneof![
        1 => Just(Act::Reset),
        2 => Just(Act::Schedule),
        1 => (1u64..=3).prop_map(Act::TimeElapse),
        4 => arb_raise().prop_map(Act::RaiseEvent),
    ]
}

fn arb_positive_assertion() -> impl Strategy<Value = Assertion> {
    prop_oneof![
        arb_raise().prop_map(Assertion::RaiseEvent),
        (
            prop_oneof![Just("ctrl".to_string()), Just("light".to_string())],
            prop_oneof![Just("main".to_string()), Just("aux".to_string())],
            prop_oneof![Just("Idle".to_string()), Just("Busy".to_string())],
            0usize..=2,
        )
            .prop_map(|(instance, region, state, depth)| {
                Assertion::State(StateAssertion {
                    instance,
                    region,
                    state,
                    depth,
                })
            }),
        (
            prop_oneof![Just("ctrl".to_string()), Just("light".to_string())],
            prop_oneof![Just("x".to_string()), Just("y".to_string())],
            0i64..=3,
        )
            .prop_map(|(instance, variable, v)| {
                Assertion::Variable(VariableAssertion {
                    instance,
                    variable,
                    value: Expression::int(v),
                })
            }),
    ]
}

pub fn arb_assertion() -> impl Strategy<Value = Assertion> {
    prop_oneof![
        4 => arb_positive_assertion(),
        1 => arb_positive_assertion().prop_map(Assertion::negated),
    ]
}

pub fn arb_step() -> impl Strategy<Value = Step> {
    (
        proptest::collection::vec(arb_act(), 0..=2),
        proptest::collection::vec(arb_assertion(), 0..=5),
    )
        .prop_map(|(actions, asserts)| Step { actions, asserts })
}

/// Acyclic traces of up to `max_steps` steps.
pub fn arb_trace(max_steps: usize) -> impl Strategy<Value = ExecutionTrace> {
    proptest::collection::vec(arb_step(), 0..=max_steps)
        .prop_map(|steps| ExecutionTrace::new("generated", "Component", steps))
}
