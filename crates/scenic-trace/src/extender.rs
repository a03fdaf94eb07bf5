//! Closed-world extension of trace steps.

use tracing::debug;

use scenic_model::{Assertion, Component, ExecutionTrace, RaiseEventAct, Step};

use crate::error::TraceError;

/// Adds `Negated(RaiseEvent)` assertions for the parameterless output events
/// of a component that a step does not raise.
///
/// Events are matched by port and event name.
#[derive(Debug, Clone)]
pub struct UnsentEventExtender {
    component: String,
    outputs: Vec<(String, String)>,
}

impl UnsentEventExtender {
    pub fn new(component: &Component) -> Self {
        Self {
            component: component.name.clone(),
            outputs: component.parameterless_output_events(),
        }
    }

    /// `(port, event)` pairs that are candidates for negation.
    pub fn output_events(&self) -> &[(String, String)] {
        &self.outputs
    }

    /// Extend every step, or every step but the first when
    /// `allow_all_steps` is false.
    pub fn extend(&self, steps: &mut [Step], allow_all_steps: bool) {
        let skip = usize::from(!allow_all_steps);
        for step in steps.iter_mut().skip(skip) {
            self.extend_step(step);
        }
    }

    pub fn extend_step(&self, step: &mut Step) {
        let missing: Vec<Assertion> = self
            .outputs
            .iter()
            .filter(|(port, event)| {
                !step.asserts.iter().any(|a| {
                    a.as_raised_event()
                        .or_else(|| a.as_forbidden_event())
                        .is_some_and(|act| act.same_event(port, event))
                })
            })
            .map(|(port, event)| {
                Assertion::negated(Assertion::RaiseEvent(RaiseEventAct::new(
                    port.clone(),
                    event.clone(),
                )))
            })
            .collect();
        step.asserts.extend(missing);
    }

    /// Extend the steps and the cycle of a trace of this component.
    pub fn extend_trace(
        &self,
        trace: &mut ExecutionTrace,
        allow_all_steps: bool,
    ) -> Result<(), TraceError> {
        if trace.component != self.component {
            return Err(TraceError::ComponentMismatch {
                trace: trace.name.clone(),
                expected: self.component.clone(),
                found: trace.component.clone(),
            });
        }
        self.extend(&mut trace.steps, allow_all_steps);
        if let Some(cycle) = &mut trace.cycle {
            self.extend(cycle, true);
        }
        debug!(
            trace = %trace.name,
            outputs = self.outputs.len(),
            "extended trace with unsent events"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenic_model::{
        EventDeclaration, EventDirection, ParameterDeclaration, Port, Realization,
    };

    fn event(name: &str, direction: EventDirection) -> EventDeclaration {
        EventDeclaration {
            name: name.into(),
            direction,
            parameters: Vec::new(),
        }
    }

    fn component() -> Component {
        Component {
            name: "Light".into(),
            ports: vec![
                Port {
                    name: "ctrl".into(),
                    realization: Realization::Provided,
                    events: vec![
                        event("on", EventDirection::Out),
                        event("off", EventDirection::Out),
                        event("toggle", EventDirection::In),
                        EventDeclaration {
                            parameters: vec![ParameterDeclaration::integer("level")],
                            ..event("dim", EventDirection::Out)
                        },
                    ],
                },
                Port {
                    name: "bus".into(),
                    realization: Realization::Required,
                    events: vec![event("request", EventDirection::In)],
                },
            ],
        }
    }

    fn raised(port: &str, event: &str) -> Assertion {
        Assertion::RaiseEvent(RaiseEventAct::new(port, event))
    }

    fn forbidden(port: &str, event: &str) -> Assertion {
        Assertion::negated(raised(port, event))
    }

    #[test]
    fn candidates_are_parameterless_outputs() {
        let extender = UnsentEventExtender::new(&component());
        assert_eq!(
            extender.output_events(),
            &[
                ("ctrl".to_string(), "on".to_string()),
                ("ctrl".to_string(), "off".to_string()),
                ("bus".to_string(), "request".to_string()),
            ]
        );
    }

    #[test]
    fn raised_events_are_not_negated() {
        let extender = UnsentEventExtender::new(&component());
        let mut step = Step::new(vec![], vec![raised("ctrl", "on")]);
        extender.extend_step(&mut step);
        assert_eq!(
            step.asserts,
            vec![
                raised("ctrl", "on"),
                forbidden("ctrl", "off"),
                forbidden("bus", "request"),
            ]
        );
    }

    #[test]
    fn extension_is_idempotent() {
        let extender = UnsentEventExtender::new(&component());
        let mut step = Step::default();
        extender.extend_step(&mut step);
        let once = step.clone();
        extender.extend_step(&mut step);
        assert_eq!(step, once);
    }

    #[test]
    fn first_step_is_skipped_unless_allowed() {
        let extender = UnsentEventExtender::new(&component());
        let mut steps = vec![Step::default(), Step::default()];
        extender.extend(&mut steps, false);
        assert!(steps[0].asserts.is_empty());
        assert_eq!(steps[1].asserts.len(), 3);

        let mut steps = vec![Step::default()];
        extender.extend(&mut steps, true);
        assert_eq!(steps[0].asserts.len(), 3);
    }

    #[test]
    fn trace_of_other_component_is_rejected() {
        let extender = UnsentEventExtender::new(&component());
        let mut trace = ExecutionTrace::new("t", "Door", vec![Step::default()]);
        let err = extender.extend_trace(&mut trace, true).unwrap_err();
        assert!(matches!(err, TraceError::ComponentMismatch { .. }));
        assert!(trace.steps[0].asserts.is_empty());
    }

    #[test]
    fn trace_cycle_is_extended_entirely() {
        let extender = UnsentEventExtender::new(&component());
        let mut trace = ExecutionTrace::new("t", "Light", vec![Step::default()]);
        trace.cycle = Some(vec![Step::default()]);
        extender.extend_trace(&mut trace, false).expect("extend");
        assert!(trace.steps[0].asserts.is_empty());
        assert_eq!(trace.cycle.as_ref().map(|c| c[0].asserts.len()), Some(3));
    }
}
