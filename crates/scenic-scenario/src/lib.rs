#![doc = include_str!("../README.md")]

pub mod determinizer;
pub mod distributor;
pub mod error;
pub mod limits;
pub mod paths;
pub mod resolver;
pub mod simple;

pub use determinizer::{determinize, DeterminizeOptions};
pub use distributor::distribute;
pub use error::{ErrorKind, Location, PathSegment, ScenarioError};
pub use limits::ExpansionLimits;
pub use paths::enumerate_paths;
pub use resolver::resolve_references;
pub use simple::{check_simple, is_simple};
