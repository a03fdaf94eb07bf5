#![doc = include_str!("../README.md")]

pub mod options;
pub mod pipeline;

pub use options::{ConfigError, PipelineOptions};
pub use pipeline::{PipelineError, ScenarioPipeline};
