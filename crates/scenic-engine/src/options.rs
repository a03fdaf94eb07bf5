#![allow(unused_assignments)]

//! Pipeline configuration.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use scenic_scenario::{DeterminizeOptions, ExpansionLimits};
use scenic_trace::CoverageRelation;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read options file {}: {source}", path.display())]
    #[diagnostic(code(scenic::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid options: {0}")]
    #[diagnostic(
        code(scenic::config::json),
        help("see the scenic-engine README for the accepted keys")
    )]
    Json(#[from] serde_json::Error),
}

/// Options for [`crate::ScenarioPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// Unroll loops while determinizing.
    pub unroll_loops: bool,
    /// Lift optionals and nested alternatives out of alternative branches
    /// before determinizing.
    pub distribute_alternatives: bool,
    pub limits: ExpansionLimits,
    /// Extend the first step of each trace with unsent events too.
    pub allow_all_steps: bool,
    pub coverage: CoverageRelation,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            unroll_loops: true,
            distribute_alternatives: true,
            limits: ExpansionLimits::default(),
            allow_all_steps: false,
            coverage: CoverageRelation::Actions,
        }
    }
}

impl PipelineOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn determinize_options(&self) -> DeterminizeOptions {
        DeterminizeOptions {
            unroll_loops: self.unroll_loops,
            limits: self.limits,
        }
    }
}
