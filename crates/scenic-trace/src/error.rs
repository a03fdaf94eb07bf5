#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum TraceError {
    #[error("Trace '{trace}' monitors component '{found}', but the extender was built for '{expected}'")]
    #[diagnostic(
        code(scenic::trace::component_mismatch),
        help("build the extender from the component named in the trace")
    )]
    ComponentMismatch {
        trace: String,
        expected: String,
        found: String,
    },
}
