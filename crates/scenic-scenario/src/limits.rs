//! Ceilings on combinatorial expansion.
//!
//! Parallel, unordered and loop expansion grow multinomially, factorially and
//! quadratically in their operands. Every expansion checks its size against
//! [`ExpansionLimits`] before materializing anything and fails with a
//! resource-limit error instead of running unbounded.

use crate::error::{Location, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default, deny_unknown_fields))]
pub struct ExpansionLimits {
    /// Maximum number of branches a single expansion may produce.
    pub max_branches: usize,
    /// Maximum nesting depth of combined fragments.
    pub max_depth: usize,
    /// Maximum number of interaction nodes emitted by one call.
    pub max_nodes: usize,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_branches: 10_000,
            max_depth: 256,
            max_nodes: 1_000_000,
        }
    }
}

impl ExpansionLimits {
    /// No ceiling at all. Only for trusted, known-small inputs.
    pub fn unbounded() -> Self {
        Self {
            max_branches: usize::MAX,
            max_depth: usize::MAX,
            max_nodes: usize::MAX,
        }
    }

    pub fn check_branches(
        &self,
        construct: &str,
        required: u128,
        location: &Location,
    ) -> Result<(), ScenarioError> {
        if required > self.max_branches as u128 {
            return Err(ScenarioError::BranchLimitExceeded {
                construct: construct.to_string(),
                required,
                limit: self.max_branches,
                location: location.clone(),
            });
        }
        Ok(())
    }

    pub fn check_depth(&self, depth: usize, location: &Location) -> Result<(), ScenarioError> {
        if depth > self.max_depth {
            return Err(ScenarioError::DepthLimitExceeded {
                depth,
                limit: self.max_depth,
                location: location.clone(),
            });
        }
        Ok(())
    }

    pub fn check_nodes(&self, nodes: usize, location: &Location) -> Result<(), ScenarioError> {
        if nodes > self.max_nodes {
            return Err(ScenarioError::NodeLimitExceeded {
                nodes,
                limit: self.max_nodes,
                location: location.clone(),
            });
        }
        Ok(())
    }
}

/// `n!`, or `None` on overflow.
pub fn factorial(n: usize) -> Option<u128> {
    (2..=n as u128).try_fold(1u128, |acc, k| acc.checked_mul(k))
}

/// `n choose k`, or `None` on overflow.
pub fn binomial(n: usize, k: usize) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k) as u128;
    let n = n as u128;
    let mut result = 1u128;
    for i in 1..=k {
        // Exact at every step: result * (n - k + i) is divisible by i.
        result = result.checked_mul(n - k + i)? / i;
    }
    Some(result)
}

/// Number of interleavings of sequences with the given lengths:
/// `(Σ len)! / Π(len!)`, or `None` on overflow.
pub fn multinomial(lengths: &[usize]) -> Option<u128> {
    let mut total = 0usize;
    let mut result = 1u128;
    for &len in lengths {
        total = total.checked_add(len)?;
        result = result.checked_mul(binomial(total, len)?)?;
    }
    Some(result)
}
