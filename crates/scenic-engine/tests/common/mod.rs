#![allow(dead_code)]

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use scenic_model::{
    Act, Assertion, CombinedFragment, Component, EventDeclaration, EventDirection, Expression,
    Interaction, ParameterDeclaration, Port, RaiseEventAct, Realization, ScenarioDefinition,
    ScenarioPackage, StateAssertion, Step,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn out_event(name: &str) -> EventDeclaration {
    EventDeclaration {
        name: name.into(),
        direction: EventDirection::Out,
        parameters: Vec::new(),
    }
}

/// A lamp with a provided `ctrl` port: `toggle` comes in, `on`, `off`,
/// `done` and `error` go out.
pub fn lamp() -> Component {
    Component {
        name: "Lamp".into(),
        ports: vec![Port {
            name: "ctrl".into(),
            realization: Realization::Provided,
            events: vec![
                EventDeclaration {
                    name: "toggle".into(),
                    direction: EventDirection::In,
                    parameters: Vec::new(),
                },
                out_event("on"),
                out_event("off"),
                out_event("done"),
                out_event("error"),
            ],
        }],
    }
}

/// `Main` toggles the lamp, blinks it between one and `MAX` times through
/// the parameterized `Blink`, then either finishes, fails or stops silently.
pub fn lamp_package() -> ScenarioPackage {
    let mut package = ScenarioPackage::new("Lamps");
    package.add_constant("MAX", Expression::int(2));
    package.component = Some(lamp());

    package.add_scenario(
        ScenarioDefinition::new(
            "Blink",
            vec![Interaction::Fragment(CombinedFragment::looped(
                Expression::int(1),
                Some(Expression::parameter("Blink", 0, "n")),
                vec![Interaction::send("ctrl", "on"), Interaction::send("ctrl", "off")].into(),
            ))]
            .into(),
        )
        .with_parameters(vec![ParameterDeclaration::integer("n")]),
    );

    package.add_scenario(ScenarioDefinition::new(
        "Main",
        vec![
            Interaction::receive("ctrl", "toggle"),
            Interaction::reference("Blink", vec![Expression::constant("MAX")]),
            Interaction::Fragment(CombinedFragment::alternative(vec![
                vec![Interaction::send("ctrl", "done")].into(),
                vec![Interaction::Fragment(CombinedFragment::optional(
                    vec![Interaction::send("ctrl", "error")].into(),
                ))]
                .into(),
            ])),
        ]
        .into(),
    ));

    package
}

pub fn input(event: &str) -> Act {
    Act::RaiseEvent(RaiseEventAct::new("ctrl", event))
}

pub fn raised(event: &str) -> Assertion {
    Assertion::RaiseEvent(RaiseEventAct::new("ctrl", event))
}

pub fn forbidden(event: &str) -> Assertion {
    Assertion::negated(raised(event))
}

pub fn in_state(state: &str) -> Assertion {
    Assertion::State(StateAssertion {
        instance: "lamp".into(),
        region: "main".into(),
        state: state.into(),
        depth: 0,
    })
}

pub fn step(actions: Vec<Act>, asserts: Vec<Assertion>) -> Step {
    Step::new(actions, asserts)
}
