mod common;

use common::*;

use scenic_engine::{PipelineError, PipelineOptions, ScenarioPipeline};
use scenic_model::{
    Act, CombinedFragment, ExecutionTrace, Expression, FragmentKind, Interaction,
    InteractionFragment, ScenarioDefinition, ScenarioPackage,
};
use scenic_scenario::{ErrorKind, ExpansionLimits, ScenarioError};
use scenic_trace::{CoverageRelation, TraceError};

fn frag(interactions: Vec<Interaction>) -> InteractionFragment {
    interactions.into()
}

fn alt(branches: Vec<InteractionFragment>) -> Interaction {
    Interaction::Fragment(CombinedFragment::alternative(branches))
}

fn send(event: &str) -> Interaction {
    Interaction::send("ctrl", event)
}

// ---------------------------------------------------------------------------
// Scenario side
// ---------------------------------------------------------------------------

#[test]
fn simplify_inlines_unrolls_and_distributes() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::default();

    let main = pipeline.simplify(&package, "Main", None).expect("simplify");

    assert_eq!(
        main.chart,
        frag(vec![
            Interaction::receive("ctrl", "toggle"),
            send("on"),
            send("off"),
            alt(vec![frag(vec![]), frag(vec![send("on"), send("off")])]),
            alt(vec![
                frag(vec![send("done")]),
                frag(vec![send("error")]),
                frag(vec![]),
            ]),
        ])
    );
    assert!(main.bindings.is_empty());
}

#[test]
fn without_distribution_optional_stays_nested() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::new(PipelineOptions {
        distribute_alternatives: false,
        ..PipelineOptions::default()
    });

    let main = pipeline.simplify(&package, "Main", None).expect("simplify");

    let last = main.chart.interactions.last().expect("non-empty chart");
    assert_eq!(
        last,
        &alt(vec![
            frag(vec![send("done")]),
            frag(vec![alt(vec![frag(vec![]), frag(vec![send("error")])])]),
        ])
    );
}

#[test]
fn kept_loops_carry_substituted_bounds() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::new(PipelineOptions {
        unroll_loops: false,
        ..PipelineOptions::default()
    });

    let main = pipeline.simplify(&package, "Main", None).expect("simplify");

    let Interaction::Fragment(cf) = &main.chart.interactions[1] else {
        panic!("expected the blink loop, got {:?}", main.chart.interactions[1]);
    };
    assert_eq!(cf.kind, FragmentKind::Loop);
    let bounds = cf.bounds.as_ref().expect("loop bounds");
    assert_eq!(bounds.minimum, Expression::int(1));
    assert_eq!(bounds.maximum, Some(Expression::int(2)));

    // Kept loops cannot be linearized.
    let err = pipeline.linearize(&main).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Scenario(ScenarioError::Unsupported { .. })
    ));
}

#[test]
fn linearize_enumerates_every_path() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::default();

    let main = pipeline.simplify(&package, "Main", None).expect("simplify");
    let paths = pipeline.linearize(&main).expect("linearize");

    assert_eq!(paths.len(), 6);
    assert_eq!(
        paths[0],
        frag(vec![
            Interaction::receive("ctrl", "toggle"),
            send("on"),
            send("off"),
            send("done"),
        ])
    );
    assert_eq!(
        paths[5],
        frag(vec![
            Interaction::receive("ctrl", "toggle"),
            send("on"),
            send("off"),
            send("on"),
            send("off"),
        ])
    );
    assert!(paths.iter().all(|p| p.interactions.iter().all(|i| matches!(i, Interaction::Leaf(_)))));
}

#[test]
fn parameterized_scenario_needs_arguments() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::default();

    let err = pipeline
        .simplify(&package, "Blink", Some(&[] as &[Expression]))
        .unwrap_err();
    match err {
        PipelineError::Scenario(e) => {
            assert_eq!(e.kind(), ErrorKind::UnresolvableReference);
            assert!(matches!(e, ScenarioError::MissingArgument { .. }));
        }
        other => panic!("expected scenario error, got {other:?}"),
    }

    let blink = pipeline
        .simplify(&package, "Blink", Some(&[Expression::int(3)][..]))
        .expect("simplify with argument");
    // One mandatory round, then zero to two more.
    let Interaction::Fragment(cf) = &blink.chart.interactions[2] else {
        panic!("expected the optional rounds");
    };
    assert_eq!(cf.fragments.len(), 3);
}

#[test]
fn one_scenario_blinks_with_different_counts() {
    init_tracing();
    let mut package = lamp_package();
    package.add_scenario(ScenarioDefinition::new(
        "Either",
        vec![Interaction::Fragment(CombinedFragment::alternative(vec![
            frag(vec![Interaction::reference("Blink", vec![Expression::int(1)])]),
            frag(vec![Interaction::reference("Blink", vec![Expression::int(3)])]),
        ]))]
        .into(),
    ));
    let pipeline = ScenarioPipeline::default();

    let either = pipeline.simplify(&package, "Either", None).expect("simplify");
    let paths = pipeline.linearize(&either).expect("linearize");

    // One round, or one to three rounds.
    let rounds: Vec<usize> = paths.iter().map(|p| p.len() / 2).collect();
    assert_eq!(rounds, vec![1, 1, 2, 3]);
}

#[test]
fn simplify_all_skips_parameterized_scenarios() {
    init_tracing();
    let package = lamp_package();
    let simplified = ScenarioPipeline::default()
        .simplify_all(&package)
        .expect("simplify all");
    let names: Vec<&str> = simplified.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Main"]);
}

#[test]
fn unknown_scenario_is_reported() {
    init_tracing();
    let err = ScenarioPipeline::default()
        .simplify(&lamp_package(), "Missing", None)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Scenario(ScenarioError::UnknownScenario { ref target, .. }) if target == "Missing"
    ));
    assert!(!err.is_resource_limit());
}

#[test]
fn path_limit_is_a_resource_error() {
    init_tracing();
    let package = lamp_package();
    let pipeline = ScenarioPipeline::new(PipelineOptions {
        limits: ExpansionLimits {
            max_branches: 5,
            ..ExpansionLimits::default()
        },
        ..PipelineOptions::default()
    });

    // Every single fragment stays below five branches.
    let main = pipeline.simplify(&package, "Main", None).expect("simplify");
    let err = pipeline.linearize(&main).unwrap_err();
    assert!(err.is_resource_limit());
    assert!(matches!(
        err,
        PipelineError::Scenario(ScenarioError::BranchLimitExceeded { .. })
    ));
}

// ---------------------------------------------------------------------------
// Trace side
// ---------------------------------------------------------------------------

fn short_trace() -> ExecutionTrace {
    ExecutionTrace::new(
        "short",
        "Lamp",
        vec![
            step(vec![Act::Reset], vec![in_state("Off")]),
            step(vec![input("toggle")], vec![in_state("On"), raised("on")]),
        ],
    )
}

fn long_trace() -> ExecutionTrace {
    let mut trace = short_trace();
    trace.name = "long".into();
    trace
        .steps
        .push(step(vec![input("toggle")], vec![in_state("Off"), raised("off")]));
    trace
}

#[test]
fn finalize_extends_canonicalizes_and_reduces() {
    init_tracing();
    let pipeline = ScenarioPipeline::default();

    let out = pipeline
        .finalize_traces(vec![short_trace(), long_trace()], &lamp())
        .expect("finalize");

    assert_eq!(out.len(), 1);
    let trace = &out[0];
    assert_eq!(trace.name, "long");
    // The first step is left alone.
    assert_eq!(trace.steps[0].asserts, vec![in_state("Off")]);
    assert_eq!(
        trace.steps[1].asserts,
        vec![
            forbidden("done"),
            forbidden("error"),
            forbidden("off"),
            raised("on"),
            in_state("On"),
        ]
    );
    assert_eq!(
        trace.steps[2].asserts,
        vec![
            forbidden("done"),
            forbidden("error"),
            raised("off"),
            forbidden("on"),
            in_state("Off"),
        ]
    );
}

#[test]
fn allow_all_steps_extends_the_first_step() {
    init_tracing();
    let pipeline = ScenarioPipeline::new(PipelineOptions {
        allow_all_steps: true,
        ..PipelineOptions::default()
    });

    let out = pipeline
        .finalize_traces(vec![short_trace()], &lamp())
        .expect("finalize");

    assert_eq!(
        out[0].steps[0].asserts,
        vec![
            forbidden("done"),
            forbidden("error"),
            forbidden("off"),
            forbidden("on"),
            in_state("Off"),
        ]
    );
}

#[test]
fn state_coverage_ignores_actions() {
    init_tracing();
    let mut other = short_trace();
    other.name = "other".into();
    other.steps[1].actions = vec![Act::Schedule];

    let by_actions = ScenarioPipeline::default()
        .finalize_traces(vec![short_trace(), other.clone()], &lamp())
        .expect("finalize");
    assert_eq!(by_actions.len(), 2);

    let by_states = ScenarioPipeline::new(PipelineOptions {
        coverage: CoverageRelation::States,
        ..PipelineOptions::default()
    })
    .finalize_traces(vec![short_trace(), other], &lamp())
    .expect("finalize");
    assert_eq!(by_states.len(), 1);
    assert_eq!(by_states[0].name, "short");
}

#[test]
fn traces_of_another_component_are_rejected() {
    init_tracing();
    let mut trace = short_trace();
    trace.component = "Heater".into();

    let err = ScenarioPipeline::default()
        .finalize_traces(vec![trace], &lamp())
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Trace(TraceError::ComponentMismatch { ref found, .. }) if found == "Heater"
    ));
}

// ---------------------------------------------------------------------------
// Configuration and persistence
// ---------------------------------------------------------------------------

#[test]
fn options_fixture_loads() {
    let options = PipelineOptions::load(fixture("options.json")).expect("load fixture");
    assert!(options.unroll_loops);
    assert!(!options.distribute_alternatives);
    assert_eq!(
        options.limits,
        ExpansionLimits {
            max_branches: 500,
            max_depth: 32,
            max_nodes: 100_000,
        }
    );
    assert!(options.allow_all_steps);
    assert_eq!(options.coverage, CoverageRelation::States);
}

#[test]
fn package_survives_a_json_file_round_trip() {
    let package = lamp_package();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lamps.json");

    std::fs::write(&path, serde_json::to_string_pretty(&package).expect("serialize"))
        .expect("write");
    let json = std::fs::read_to_string(&path).expect("read");
    let loaded: ScenarioPackage = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(loaded, package);
    let pipeline = ScenarioPipeline::default();
    assert_eq!(
        pipeline.simplify(&loaded, "Main", None).expect("simplify"),
        pipeline.simplify(&package, "Main", None).expect("simplify"),
    );
}
