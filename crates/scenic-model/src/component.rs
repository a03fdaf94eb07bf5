//! Interfaces of the monitored component.

use crate::scenario::ParameterDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum EventDirection {
    In,
    Out,
    InOut,
}

/// Whether the component implements the port's interface or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum Realization {
    Provided,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventDeclaration {
    pub name: String,
    pub direction: EventDirection,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub parameters: Vec<ParameterDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Port {
    pub name: String,
    pub realization: Realization,
    pub events: Vec<EventDeclaration>,
}

impl Port {
    /// Events this port lets the component emit.
    ///
    /// Interface directions are written from the provider's side, so a
    /// required port flips them.
    pub fn output_events(&self) -> impl Iterator<Item = &EventDeclaration> + '_ {
        self.events.iter().filter(move |e| {
            matches!(
                (self.realization, e.direction),
                (_, EventDirection::InOut)
                    | (Realization::Provided, EventDirection::Out)
                    | (Realization::Required, EventDirection::In)
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    pub name: String,
    pub ports: Vec<Port>,
}

impl Component {
    /// `(port, event)` name pairs of every parameterless output event.
    pub fn parameterless_output_events(&self) -> Vec<(String, String)> {
        self.ports
            .iter()
            .flat_map(|port| {
                port.output_events()
                    .filter(|e| e.parameters.is_empty())
                    .map(move |e| (port.name.clone(), e.name.clone()))
            })
            .collect()
    }
}
