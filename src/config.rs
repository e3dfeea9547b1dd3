//! Loading and validating tracker settings
//!
//! Settings are read from TOML. Missing keys fall back to
//! [`TrackerSettings::default`].
//!
//! ```toml
//! fixed_step = 0.03
//! max_frame_time = 0.25
//! source = "combined"
//! reset_policy = "reference_frame_only"
//! node_axes = "NxNyPz"
//! ```

use std::path::Path;

use tracing::info;

use crate::error::ConfigError;
use crate::types::TrackerSettings;

impl TrackerSettings {
    /// Parse settings from a TOML document and validate them.
    ///
    /// # Example
    /// ```
    /// use fdai_attitude::{OrientationSource, TrackerSettings};
    ///
    /// let settings = TrackerSettings::from_toml_str("source = \"impulse\"").unwrap();
    /// assert_eq!(settings.source, OrientationSource::Impulse);
    /// assert_eq!(settings.fixed_step, 0.03);
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: TrackerSettings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        info!(?path, "Loaded tracker settings");
        Ok(settings)
    }

    /// Serialize settings to a TOML document.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the settings for values the integrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_step.is_finite() && self.fixed_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_step must be positive, got {}",
                self.fixed_step
            )));
        }
        if !(self.max_frame_time.is_finite() && self.max_frame_time >= self.fixed_step) {
            return Err(ConfigError::Invalid(format!(
                "max_frame_time ({}) must be at least fixed_step ({})",
                self.max_frame_time, self.fixed_step
            )));
        }
        if !(self.publish_interval.is_finite() && self.publish_interval >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "publish_interval must be non-negative, got {}",
                self.publish_interval
            )));
        }
        if !self.impulse_angle.is_finite() {
            return Err(ConfigError::Invalid("impulse_angle must be finite".into()));
        }
        Ok(())
    }
}
