#![doc = include_str!("../README.md")]

pub mod canonical;
pub mod coverage;
pub mod error;
pub mod extender;

pub use canonical::{canonicalize, canonicalize_trace};
pub use coverage::{
    is_covered, is_covered_by_states, partition_by_reset, reduce_to_antichain,
    reduce_to_antichain_with, CoverageRelation,
};
pub use error::TraceError;
pub use extender::UnsentEventExtender;
