#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use scenic_model::EvalError;

/// One step of a path from a scenario root to an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Position in an interaction sequence.
    Interaction(usize),
    /// Operand of a combined fragment.
    Fragment(usize),
    /// Member of an interaction set.
    Member(usize),
    /// Position in the initial block.
    Initial(usize),
}

/// Location of an interaction inside a scenario, e.g. `Main:chart[2]/fragment[0][1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub scenario: String,
    pub path: Vec<PathSegment>,
}

impl Location {
    pub fn new(scenario: impl Into<String>, path: Vec<PathSegment>) -> Self {
        Self {
            scenario: scenario.into(),
            path,
        }
    }

    pub fn root(scenario: impl Into<String>) -> Self {
        Self::new(scenario, Vec::new())
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.scenario)?;
        if !matches!(self.path.first(), Some(PathSegment::Initial(_))) {
            f.write_str("chart")?;
        }
        for segment in &self.path {
            match segment {
                PathSegment::Interaction(i) => write!(f, "[{i}]")?,
                PathSegment::Fragment(i) => write!(f, "/fragment[{i}]")?,
                PathSegment::Member(i) => write!(f, "/member[{i}]")?,
                PathSegment::Initial(i) => write!(f, "initial[{i}]")?,
            }
        }
        Ok(())
    }
}

/// Coarse classification of [`ScenarioError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A construct no rewrite rule covers; a modeling gap.
    UnsupportedConstruct,
    /// Missing reference target, unbound parameter, or reference cycle.
    UnresolvableReference,
    /// Loop bounds that are inverted, negative, or not constant.
    InvalidBound,
    /// A configured expansion limit was hit.
    CombinatorialOverflow,
}

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ScenarioError {
    #[error("Unsupported construct at {location}: {construct}")]
    #[diagnostic(code(scenic::scenario::unsupported))]
    Unsupported { construct: String, location: Location },

    #[error("Unknown scenario '{target}' referenced at {location}")]
    #[diagnostic(
        code(scenic::scenario::unknown_scenario),
        help("add the referenced scenario to the package")
    )]
    UnknownScenario { target: String, location: Location },

    #[error(
        "Reference to '{target}' at {location} passes {given} argument(s), expected {expected}"
    )]
    #[diagnostic(code(scenic::scenario::argument_count))]
    ArgumentCountMismatch {
        target: String,
        given: usize,
        expected: usize,
        location: Location,
    },

    #[error("Reference to '{target}' at {location} closes the cycle {cycle}")]
    #[diagnostic(
        code(scenic::scenario::reference_cycle),
        help("scenario references must not form a cycle")
    )]
    ReferenceCycle {
        target: String,
        /// Scenario names along the cycle, e.g. `A -> B -> A`.
        cycle: String,
        location: Location,
    },

    #[error("Unresolved reference to '{target}' at {location}")]
    #[diagnostic(
        code(scenic::scenario::unresolved_reference),
        help("run reference resolution before determinization")
    )]
    UnresolvedReference { target: String, location: Location },

    #[error("Parameter '{parameter}' of scenario '{scenario}' has no argument (at {location})")]
    #[diagnostic(code(scenic::scenario::missing_argument))]
    MissingArgument {
        parameter: String,
        scenario: String,
        location: Location,
    },

    #[error("Unknown constant '{name}' at {location}")]
    #[diagnostic(code(scenic::scenario::unknown_constant))]
    UnknownConstant { name: String, location: Location },

    #[error("Substitution of '{name}' at {location} does not terminate")]
    #[diagnostic(code(scenic::scenario::cyclic_substitution))]
    CyclicSubstitution { name: String, location: Location },

    #[error("Loop bound at {location} is not constant: {source}")]
    #[diagnostic(
        code(scenic::scenario::non_constant_bound),
        help("loop bounds must fold to integers once parameters and constants are substituted")
    )]
    NonConstantBound {
        location: Location,
        #[source]
        source: EvalError,
    },

    #[error("Invalid loop bounds at {location}: {reason}")]
    #[diagnostic(code(scenic::scenario::invalid_bound))]
    InvalidBound { reason: String, location: Location },

    #[error(
        "Expanding the {construct} at {location} needs {required} branches, \
         exceeding the limit of {limit}"
    )]
    #[diagnostic(
        code(scenic::scenario::branch_limit),
        help("raise ExpansionLimits::max_branches or simplify the scenario")
    )]
    BranchLimitExceeded {
        construct: String,
        required: u128,
        limit: usize,
        location: Location,
    },

    #[error("Nesting depth {depth} at {location} exceeds the limit of {limit}")]
    #[diagnostic(code(scenic::scenario::depth_limit))]
    DepthLimitExceeded {
        depth: usize,
        limit: usize,
        location: Location,
    },

    #[error("Expansion at {location} emits {nodes} nodes, exceeding the limit of {limit}")]
    #[diagnostic(
        code(scenic::scenario::node_limit),
        help("raise ExpansionLimits::max_nodes or simplify the scenario")
    )]
    NodeLimitExceeded {
        nodes: usize,
        limit: usize,
        location: Location,
    },
}

impl ScenarioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScenarioError::Unsupported { .. } => ErrorKind::UnsupportedConstruct,
            ScenarioError::UnknownScenario { .. }
            | ScenarioError::ArgumentCountMismatch { .. }
            | ScenarioError::ReferenceCycle { .. }
            | ScenarioError::UnresolvedReference { .. }
            | ScenarioError::MissingArgument { .. }
            | ScenarioError::UnknownConstant { .. }
            | ScenarioError::CyclicSubstitution { .. } => ErrorKind::UnresolvableReference,
            ScenarioError::NonConstantBound { .. } | ScenarioError::InvalidBound { .. } => {
                ErrorKind::InvalidBound
            }
            ScenarioError::BranchLimitExceeded { .. }
            | ScenarioError::DepthLimitExceeded { .. }
            | ScenarioError::NodeLimitExceeded { .. } => ErrorKind::CombinatorialOverflow,
        }
    }

    /// True if the error is a resource limit rather than a modeling error.
    pub fn is_resource_limit(&self) -> bool {
        self.kind() == ErrorKind::CombinatorialOverflow
    }

    pub fn location(&self) -> &Location {
        match self {
            ScenarioError::Unsupported { location, .. }
            | ScenarioError::UnknownScenario { location, .. }
            | ScenarioError::ArgumentCountMismatch { location, .. }
            | ScenarioError::ReferenceCycle { location, .. }
            | ScenarioError::UnresolvedReference { location, .. }
            | ScenarioError::MissingArgument { location, .. }
            | ScenarioError::UnknownConstant { location, .. }
            | ScenarioError::CyclicSubstitution { location, .. }
            | ScenarioError::NonConstantBound { location, .. }
            | ScenarioError::InvalidBound { location, .. }
            | ScenarioError::BranchLimitExceeded { location, .. }
            | ScenarioError::DepthLimitExceeded { location, .. }
            | ScenarioError::NodeLimitExceeded { location, .. } => location,
        }
    }
}
