//! Viewer configuration.
//!
//! Every field has a default so a partial (or empty) JSON object is a valid
//! configuration. The image-engine settings are applied once per process by
//! an explicit initialisation call rather than at module load.

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

pub const DEFAULT_METADATA_BASE_URL: &str = "http://localhost:9999";
pub const DEFAULT_CINE_INTERVAL_MS: u32 = 100;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;

/// Settings handed to the image engine's one-time initialisation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decode pixel data on web workers instead of the main thread.
    pub enable_worker_decoding: bool,
    /// Keep floating point pixel data as floats instead of converting to ints.
    pub preserve_float_precision: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_worker_decoding: true,
            preserve_float_precision: true,
        }
    }
}

/// Scale range enforced by every zoom entry point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: MIN_SCALE, max: MAX_SCALE }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Root of the metadata service (no trailing slash required).
    pub metadata_base_url: String,
    pub engine: EngineConfig,
    /// Delay between slices while cine playback runs.
    pub cine_interval_ms: u32,
    pub zoom: ZoomLimits,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            metadata_base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            engine: EngineConfig::default(),
            cine_interval_ms: DEFAULT_CINE_INTERVAL_MS,
            zoom: ZoomLimits::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.zoom.min > self.zoom.max || self.zoom.min <= 0.0 {
            return Err(ConfigError::ZoomLimits {
                min: self.zoom.min,
                max: self.zoom.max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = ViewerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.metadata_base_url, "http://localhost:9999");
        assert!(config.engine.enable_worker_decoding);
        assert!(config.engine.preserve_float_precision);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_json_str(
            r#"{"metadata_base_url": "https://pacs.example", "engine": {"enable_worker_decoding": false}}"#,
        )
        .unwrap();
        assert_eq!(config.metadata_base_url, "https://pacs.example");
        assert!(!config.engine.enable_worker_decoding);
        assert!(config.engine.preserve_float_precision);
        assert_eq!(config.cine_interval_ms, DEFAULT_CINE_INTERVAL_MS);
    }

    #[test]
    fn test_inverted_zoom_limits_rejected() {
        let err = ViewerConfig::from_json_str(r#"{"zoom": {"min": 4.0, "max": 2.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZoomLimits { .. }));
    }

    #[test]
    fn test_zoom_limits_clamp() {
        let limits = ZoomLimits::default();
        assert_eq!(limits.clamp(0.01), 0.1);
        assert_eq!(limits.clamp(12.0), 5.0);
        assert_eq!(limits.clamp(1.3), 1.3);
    }
}
