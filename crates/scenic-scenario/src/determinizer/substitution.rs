//! Parameter and constant substitution.

use indexmap::IndexMap;
use tracing::warn;

use scenic_model::{
    Annotation, ConstantTable, Delay, Expression, InteractionDefinition, Leaf, ScenarioDefinition,
    Signal,
};

use crate::error::{Location, ScenarioError};

/// Bound on chained parameter/constant lookups before substitution is
/// considered cyclic.
const MAX_SUBSTITUTION_DEPTH: usize = 64;

/// Arguments for the parameters of one determinization call, keyed by
/// `(defining scenario, parameter index)`.
///
/// In symbolic mode parameters without an argument are kept as they are.
#[derive(Debug, Clone)]
pub struct SubstitutionEnv<'a> {
    bindings: IndexMap<(String, usize), Expression>,
    constants: &'a ConstantTable,
    symbolic: bool,
}

impl<'a> SubstitutionEnv<'a> {
    /// Build the environment for `scenario`.
    ///
    /// `arguments` bind the root scenario's own parameters positionally;
    /// `None` selects symbolic mode. Bindings recorded by reference
    /// resolution cover the parameters of inlined scenarios.
    pub fn new(
        scenario: &ScenarioDefinition,
        constants: &'a ConstantTable,
        arguments: Option<&[Expression]>,
    ) -> Self {
        let mut bindings = IndexMap::new();
        if let Some(arguments) = arguments {
            if arguments.len() > scenario.parameters.len() {
                warn!(
                    scenario = %scenario.name,
                    given = arguments.len(),
                    declared = scenario.parameters.len(),
                    "ignoring surplus arguments"
                );
            }
            for (index, argument) in arguments
                .iter()
                .take(scenario.parameters.len())
                .enumerate()
            {
                bindings.insert((scenario.name.clone(), index), argument.clone());
            }
        }
        for binding in &scenario.bindings {
            bindings
                .entry((binding.scenario.clone(), binding.index))
                .or_insert_with(|| binding.value.clone());
        }
        Self {
            bindings,
            constants,
            symbolic: arguments.is_none(),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        self.symbolic
    }

    pub fn constants(&self) -> &ConstantTable {
        self.constants
    }

    pub fn expression(
        &self,
        expr: &Expression,
        location: &Location,
    ) -> Result<Expression, ScenarioError> {
        self.substitute(expr, location, 0)
    }

    fn substitute(
        &self,
        expr: &Expression,
        location: &Location,
        depth: usize,
    ) -> Result<Expression, ScenarioError> {
        match expr {
            Expression::Int(_) | Expression::Bool(_) | Expression::Variable(_) => Ok(expr.clone()),
            Expression::Parameter(param) => {
                let key = (param.scenario.clone(), param.index);
                match self.bindings.get(&key) {
                    Some(value) => {
                        if depth >= MAX_SUBSTITUTION_DEPTH {
                            return Err(ScenarioError::CyclicSubstitution {
                                name: param.name.clone(),
                                location: location.clone(),
                            });
                        }
                        self.substitute(value, location, depth + 1)
                    }
                    None if self.symbolic => Ok(expr.clone()),
                    None => Err(ScenarioError::MissingArgument {
                        parameter: param.name.clone(),
                        scenario: param.scenario.clone(),
                        location: location.clone(),
                    }),
                }
            }
            Expression::Constant(name) => {
                let value =
                    self.constants
                        .get(name)
                        .ok_or_else(|| ScenarioError::UnknownConstant {
                            name: name.clone(),
                            location: location.clone(),
                        })?;
                if depth >= MAX_SUBSTITUTION_DEPTH {
                    return Err(ScenarioError::CyclicSubstitution {
                        name: name.clone(),
                        location: location.clone(),
                    });
                }
                self.substitute(value, location, depth + 1)
            }
            Expression::Unary { op, operand } => Ok(Expression::Unary {
                op: *op,
                operand: Box::new(self.substitute(operand, location, depth)?),
            }),
            Expression::Binary { op, lhs, rhs } => Ok(Expression::Binary {
                op: *op,
                lhs: Box::new(self.substitute(lhs, location, depth)?),
                rhs: Box::new(self.substitute(rhs, location, depth)?),
            }),
        }
    }

    pub fn leaf(&self, leaf: &Leaf, location: &Location) -> Result<Leaf, ScenarioError> {
        Ok(match leaf {
            Leaf::Signal(signal) => Leaf::Signal(Signal {
                arguments: signal
                    .arguments
                    .iter()
                    .map(|a| self.expression(a, location))
                    .collect::<Result<_, _>>()?,
                ..signal.clone()
            }),
            Leaf::Delay(delay) => Leaf::Delay(Delay {
                modality: delay.modality,
                minimum: self.expression(&delay.minimum, location)?,
                maximum: delay
                    .maximum
                    .as_ref()
                    .map(|m| self.expression(m, location))
                    .transpose()?,
            }),
            Leaf::Reset(reset) => Leaf::Reset(reset.clone()),
        })
    }

    pub fn definition(
        &self,
        definition: &InteractionDefinition,
        location: &Location,
    ) -> Result<InteractionDefinition, ScenarioError> {
        Ok(match definition {
            InteractionDefinition::Leaf(leaf) => InteractionDefinition::Leaf(self.leaf(leaf, location)?),
            InteractionDefinition::Negated(leaf) => {
                InteractionDefinition::Negated(self.leaf(leaf, location)?)
            }
        })
    }

    pub fn annotation(
        &self,
        annotation: &Annotation,
        location: &Location,
    ) -> Result<Annotation, ScenarioError> {
        Ok(match annotation {
            Annotation::WaitBound { minimum, maximum } => Annotation::WaitBound {
                minimum: self.expression(minimum, location)?,
                maximum: self.expression(maximum, location)?,
            },
            other => other.clone(),
        })
    }
}
