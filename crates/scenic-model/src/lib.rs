#![doc = include_str!("../README.md")]

//! Scenic data model.
//!
//! This crate defines the scenario side (expressions, interaction trees,
//! scenario definitions and packages), the monitored component's interface,
//! and the execution-trace side consumed by the trace reducer.

pub mod component;
pub mod expression;
pub mod interaction;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod scenario;
pub mod trace;

pub use component::{Component, EventDeclaration, EventDirection, Port, Realization};
pub use expression::{BinaryOp, ConstantTable, EvalError, Expression, ParameterRef, UnaryOp, Value};
pub use interaction::{
    CombinedFragment, Delay, Direction, FragmentKind, Interaction, InteractionDefinition,
    InteractionFragment, Leaf, LoopBounds, Modality, Reset, ScenarioReference, Signal,
};
pub use scenario::{
    Annotation, ParameterBinding, ParameterDeclaration, ParameterType, ScenarioDefinition,
    ScenarioPackage, ViolationDedication,
};
pub use trace::{
    Act, Assertion, ExecutionTrace, RaiseEventAct, StateAssertion, Step, VariableAssertion,
};
