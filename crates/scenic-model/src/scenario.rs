//! Scenario definitions and the package that scopes them.

use indexmap::IndexMap;

use crate::component::Component;
use crate::expression::{ConstantTable, Expression};
use crate::interaction::{InteractionFragment, Leaf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum ParameterType {
    Integer,
    Boolean,
}

/// Parameter definition (e.g., `n: integer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterDeclaration {
    pub name: String,
    pub ty: ParameterType,
}

impl ParameterDeclaration {
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Integer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "lowercase"))]
pub enum ViolationDedication {
    Permissive,
    Strict,
}

/// Scenario-level tags that tune how a monitor treats deviations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Annotation {
    Strict,
    Permissive,
    NegatedStrict,
    NegatedPermissive,
    ViolationDedication(ViolationDedication),
    /// Bounds on how long the monitor waits for the next interaction.
    WaitBound {
        minimum: Expression,
        maximum: Expression,
    },
}

/// Argument bound to a parameter of an inlined scenario.
///
/// Produced when a reference is inlined; `scenario` names the inlined copy
/// (`Callee#2`), which is also the scope of the parameter references inside
/// it. Consumed by the determinizer's substitution environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBinding {
    pub scenario: String,
    pub index: usize,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioDefinition {
    pub name: String,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub parameters: Vec<ParameterDeclaration>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub initial_block: Option<Vec<Leaf>>,
    pub chart: InteractionFragment,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub annotations: Vec<Annotation>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub bindings: Vec<ParameterBinding>,
}

impl ScenarioDefinition {
    pub fn new(name: impl Into<String>, chart: InteractionFragment) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            initial_block: None,
            chart,
            annotations: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterDeclaration>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn find_parameter(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Node count of the chart plus the initial block.
    pub fn node_count(&self) -> usize {
        self.chart.node_count() + self.initial_block.as_ref().map_or(0, Vec::len)
    }
}

/// Named scenarios, constants and the monitored component of one model.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioPackage {
    pub name: String,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub constants: ConstantTable,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub scenarios: IndexMap<String, ScenarioDefinition>,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub component: Option<Component>,
}

impl ScenarioPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_scenario(&mut self, scenario: ScenarioDefinition) {
        self.scenarios.insert(scenario.name.clone(), scenario);
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: Expression) {
        self.constants.insert(name.into(), value);
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioDefinition> {
        self.scenarios.get(name)
    }

    /// Sum of the node counts of every scenario in the package.
    pub fn node_count(&self) -> usize {
        self.scenarios.values().map(ScenarioDefinition::node_count).sum()
    }
}
