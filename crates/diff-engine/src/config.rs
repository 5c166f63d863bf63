//! Configuration for a diff run.

use diff_ops::FaultPolicy;
use serde::{Deserialize, Serialize};
use solid_types::AggregationMode;

use crate::types::ConfigurationError;

/// Minimum absolute volume a shape needs to count.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Geometric tolerance handed to the kernel before the booleans.
pub const DEFAULT_BOOLEAN_TOLERANCE: f64 = 1e-3;

/// Parameters of a diff run. Fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Significance threshold; `|volume| > epsilon` counts.
    pub epsilon: f64,
    /// How each version's solids are consolidated.
    pub mode: AggregationMode,
    /// Kernel tolerance for the run, put back afterwards. `None` leaves the
    /// kernel's own.
    pub boolean_tolerance: Option<f64>,
    /// Cosmetic seam removal on fused aggregates and on results.
    pub clean_seams: bool,
    /// Which kernel faults leave a category empty instead of aborting.
    pub fault_policy: FaultPolicy,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            mode: AggregationMode::Union,
            boolean_tolerance: Some(DEFAULT_BOOLEAN_TOLERANCE),
            clean_seams: true,
            fault_policy: FaultPolicy::default(),
        }
    }
}

impl DiffConfig {
    /// Fuse each version into one solid.
    pub fn union() -> Self {
        Self::default()
    }

    /// Keep each version's solids as a compound.
    pub fn preservation() -> Self {
        Self {
            mode: AggregationMode::Preservation,
            ..Self::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigurationError::Invalid {
                reason: format!("epsilon must be finite and non-negative, got {}", self.epsilon),
            });
        }
        if let Some(tol) = self.boolean_tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(ConfigurationError::Invalid {
                    reason: format!("boolean tolerance must be finite and positive, got {tol}"),
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigurationError::Invalid {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
