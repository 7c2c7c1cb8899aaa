//! Client configuration
//!
//! Loaded from RON. Every field has a default, so an empty `()` document
//! is a valid configuration.
//!
//! ```ron
//! (
//!     interpolation: (
//!         alpha: 0.2,
//!         epsilon: 0.1,
//!     ),
//! )
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Smoothing parameters for position interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Fraction of the remaining distance covered per tick, in (0, 1)
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Per-axis distance under which the interpolator snaps to its target
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
}

fn default_alpha() -> f32 {
    0.2
}

fn default_epsilon() -> f32 {
    0.1
}

impl InterpolationConfig {
    /// Create a configuration with explicit parameters
    pub fn new(alpha: f32, epsilon: f32) -> Self {
        Self { alpha, epsilon }
    }

    /// Check the parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            epsilon: default_epsilon(),
        }
    }
}

/// Root configuration for a sync client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub interpolation: InterpolationConfig,
}

impl SyncConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: SyncConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded sync config");
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.interpolation.validate()
    }
}
