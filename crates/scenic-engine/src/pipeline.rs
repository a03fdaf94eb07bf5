#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use scenic_model::{
    Component, ExecutionTrace, Expression, InteractionFragment, ScenarioDefinition,
    ScenarioPackage,
};
use scenic_scenario::{
    check_simple, determinize, distribute, enumerate_paths, resolve_references, Location,
    ScenarioError,
};
use scenic_trace::{canonicalize_trace, reduce_to_antichain_with, TraceError, UnsentEventExtender};

use crate::options::{ConfigError, PipelineOptions};

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// True if raising an expansion limit might let the call succeed.
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, PipelineError::Scenario(e) if e.is_resource_limit())
    }
}

const NO_ARGUMENTS: &[Expression] = &[];

/// Runs the scenario and trace stages with one set of options.
#[derive(Debug, Clone, Default)]
pub struct ScenarioPipeline {
    options: PipelineOptions,
}

impl ScenarioPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Resolve, distribute (if enabled) and determinize scenario `name` of
    /// `package`.
    pub fn simplify(
        &self,
        package: &ScenarioPackage,
        name: &str,
        arguments: Option<&[Expression]>,
    ) -> Result<ScenarioDefinition, PipelineError> {
        let scenario = package
            .scenario(name)
            .ok_or_else(|| ScenarioError::UnknownScenario {
                target: name.to_string(),
                location: Location::root(&package.name),
            })?;

        info!(package = %package.name, scenario = name, "Resolving scenario references...");
        let resolved = resolve_references(scenario, package, &self.options.limits)?;

        let normalized = if self.options.distribute_alternatives {
            info!(scenario = name, "Distributing nested fragments...");
            distribute(&resolved)?
        } else {
            resolved
        };

        info!(
            scenario = name,
            unroll_loops = self.options.unroll_loops,
            "Determinizing..."
        );
        let simplified = determinize(
            &normalized,
            &package.constants,
            arguments,
            &self.options.determinize_options(),
        )?;
        info!(
            scenario = name,
            nodes = simplified.chart.node_count(),
            "Scenario simplified"
        );
        Ok(simplified)
    }

    /// Simplify every parameterless scenario of `package`, in package order.
    pub fn simplify_all(
        &self,
        package: &ScenarioPackage,
    ) -> Result<Vec<ScenarioDefinition>, PipelineError> {
        package
            .scenarios
            .values()
            .filter(|s| s.parameters.is_empty())
            .map(|s| self.simplify(package, &s.name, Some(NO_ARGUMENTS)))
            .collect()
    }

    /// Every linear interaction sequence of a simplified scenario.
    pub fn linearize(
        &self,
        scenario: &ScenarioDefinition,
    ) -> Result<Vec<InteractionFragment>, PipelineError> {
        check_simple(scenario, false)?;
        let paths = enumerate_paths(scenario, &self.options.limits)?;
        info!(scenario = %scenario.name, paths = paths.len(), "Scenario linearized");
        Ok(paths)
    }

    /// Extend, canonicalize and reduce the traces recorded for `component`.
    pub fn finalize_traces(
        &self,
        traces: Vec<ExecutionTrace>,
        component: &Component,
    ) -> Result<Vec<ExecutionTrace>, PipelineError> {
        let extender = UnsentEventExtender::new(component);
        let mut traces = traces;
        for trace in &mut traces {
            extender.extend_trace(trace, self.options.allow_all_steps)?;
            canonicalize_trace(trace);
        }
        let before = traces.len();
        let reduced = reduce_to_antichain_with(traces, self.options.coverage);
        info!(
            component = %component.name,
            traces_in = before,
            traces_out = reduced.len(),
            "Traces finalized"
        );
        Ok(reduced)
    }
}
