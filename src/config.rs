use serde::{Deserialize, Serialize};

use crate::error::{Result, SmoothError};

/// Radius used when none is configured.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Parameters for one smoothing run. Fixed for the duration of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Neighborhood radius, inclusive.
    pub radius: f64,
    /// Number of passes. Each pass re-indexes the previous pass's output.
    pub iterations: u32,
    /// Run the per-point loop on the rayon pool when the `parallel` feature
    /// is enabled. Ignored otherwise.
    pub parallel: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            iterations: 1,
            parallel: true,
        }
    }
}

impl SmoothingConfig {
    pub fn with_radius(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)
    }
}

pub fn validate_radius(radius: f64) -> Result<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(SmoothError::InvalidRadius(radius))
    }
}
