//! Execution traces: what a monitor or test driver replays against a
//! component, one [`Step`] at a time.
//!
//! Actions drive the component (stimuli), assertions describe what must be
//! observable after the step.

use crate::expression::Expression;

/// Event raised on a port, either as stimulus or as expected output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RaiseEventAct {
    pub port: String,
    pub event: String,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub arguments: Vec<Expression>,
}

impl RaiseEventAct {
    pub fn new(port: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            event: event.into(),
            arguments: Vec::new(),
        }
    }

    pub fn same_event(&self, port: &str, event: &str) -> bool {
        self.port == port && self.event == event
    }
}

/// Driver action of a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Act {
    Reset,
    Schedule,
    /// Let the given amount of time elapse.
    TimeElapse(u64),
    RaiseEvent(RaiseEventAct),
}

/// Expected active state of a component instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StateAssertion {
    pub instance: String,
    pub region: String,
    pub state: String,
    /// Nesting depth of `state` in the statechart (top-level states are 0).
    pub depth: usize,
}

/// Expected value of a component instance variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableAssertion {
    pub instance: String,
    pub variable: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Assertion {
    RaiseEvent(RaiseEventAct),
    State(StateAssertion),
    Variable(VariableAssertion),
    Negated(Box<Assertion>),
}

impl Assertion {
    pub fn negated(inner: Assertion) -> Self {
        Assertion::Negated(Box::new(inner))
    }

    /// The positive event assertion, if this is one.
    pub fn as_raised_event(&self) -> Option<&RaiseEventAct> {
        match self {
            Assertion::RaiseEvent(act) => Some(act),
            _ => None,
        }
    }

    /// The event a negated event assertion forbids, if this is one.
    pub fn as_forbidden_event(&self) -> Option<&RaiseEventAct> {
        match self {
            Assertion::Negated(inner) => inner.as_raised_event(),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&StateAssertion> {
        match self {
            Assertion::State(state) => Some(state),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    #[cfg_attr(feature = "serialize", serde(default))]
    pub actions: Vec<Act>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub asserts: Vec<Assertion>,
}

impl Step {
    pub fn new(actions: Vec<Act>, asserts: Vec<Assertion>) -> Self {
        Self { actions, asserts }
    }

    pub fn has_reset(&self) -> bool {
        self.actions.iter().any(|a| matches!(a, Act::Reset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionTrace {
    pub name: String,
    /// Name of the monitored component.
    pub component: String,
    pub steps: Vec<Step>,
    /// Steps repeated forever after `steps`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub cycle: Option<Vec<Step>>,
}

impl ExecutionTrace {
    pub fn new(name: impl Into<String>, component: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            steps,
            cycle: None,
        }
    }

    pub fn is_cyclic(&self) -> bool {
        self.cycle.is_some()
    }
}
