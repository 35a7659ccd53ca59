//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, WifiScopeError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Measurement sampling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    /// Interval between periodic samples in milliseconds.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Use the synthetic sampler instead of host telemetry.
    #[serde(default)]
    pub synthetic: bool,

    /// Cap on the persistence round trip used as the latency probe.
    /// A stalled backend only costs this much of a tick, never the cadence.
    #[serde(default = "default_latency_probe_timeout_ms")]
    pub latency_probe_timeout_ms: u64,
}

/// Connectivity monitoring configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectivityConfig {
    /// Interval between connectivity re-checks in milliseconds.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// When true, a non-WiFi link counts as a connectivity error.
    #[serde(default = "default_require_wifi")]
    pub require_wifi: bool,
}

/// Scene, camera, and marker display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SceneConfig {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Vertical field of view in degrees.
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,

    /// Depth used when a raycast hits no scene geometry, and the distance at
    /// which a marker renders at scale 1.0.
    #[serde(default = "default_reference_distance")]
    pub reference_distance: f32,

    #[serde(default = "default_min_scale")]
    pub min_scale: f32,

    #[serde(default = "default_max_scale")]
    pub max_scale: f32,

    /// World-space vertical offset of a marker's label above its mesh.
    #[serde(default = "default_label_offset")]
    pub label_offset: f32,

    /// Enable interactive orbit controls on the camera.
    #[serde(default = "default_orbit_enabled")]
    pub orbit_enabled: bool,
}

/// Signal-quality threshold configuration.
///
/// One canonical table: `>= good_dbm` is good, `>= warning_dbm` is warning,
/// anything weaker is poor.
#[derive(Debug, Deserialize, Clone)]
pub struct ClassificationConfig {
    #[serde(default = "default_good_dbm")]
    pub good_dbm: f64,

    #[serde(default = "default_warning_dbm")]
    pub warning_dbm: f64,
}

/// Persistence backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_sample_interval_ms() -> u64 { 2000 }
fn default_latency_probe_timeout_ms() -> u64 { 1500 }

fn default_check_interval_ms() -> u64 { 5000 }
fn default_require_wifi() -> bool { true }

fn default_viewport_width() -> u32 { 1920 }
fn default_viewport_height() -> u32 { 1080 }
fn default_fov_degrees() -> f32 { 75.0 }
fn default_reference_distance() -> f32 { 5.0 }
fn default_min_scale() -> f32 { 0.5 }
fn default_max_scale() -> f32 { 2.0 }
fn default_label_offset() -> f32 { 0.2 }
fn default_orbit_enabled() -> bool { true }

fn default_good_dbm() -> f64 { -50.0 }
fn default_warning_dbm() -> f64 { -70.0 }

fn default_persistence_enabled() -> bool { true }

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            synthetic: false,
            latency_probe_timeout_ms: default_latency_probe_timeout_ms(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            require_wifi: default_require_wifi(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            fov_degrees: default_fov_degrees(),
            reference_distance: default_reference_distance(),
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
            label_offset: default_label_offset(),
            orbit_enabled: default_orbit_enabled(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            good_dbm: default_good_dbm(),
            warning_dbm: default_warning_dbm(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_persistence_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wifi_scope::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidation` if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.sample_interval_ms == 0 {
            return Err(WifiScopeError::ConfigValidation(
                "sampling.sample_interval_ms must be > 0".to_string(),
            ));
        }
        if self.connectivity.check_interval_ms == 0 {
            return Err(WifiScopeError::ConfigValidation(
                "connectivity.check_interval_ms must be > 0".to_string(),
            ));
        }
        if self.scene.viewport_width == 0 || self.scene.viewport_height == 0 {
            return Err(WifiScopeError::ConfigValidation(
                "scene viewport dimensions must be > 0".to_string(),
            ));
        }
        if !(self.scene.fov_degrees > 0.0 && self.scene.fov_degrees < 180.0) {
            return Err(WifiScopeError::ConfigValidation(format!(
                "scene.fov_degrees must be in (0, 180), got {}",
                self.scene.fov_degrees
            )));
        }
        if self.scene.reference_distance <= 0.0 {
            return Err(WifiScopeError::ConfigValidation(
                "scene.reference_distance must be > 0".to_string(),
            ));
        }
        if self.scene.min_scale <= 0.0 || self.scene.min_scale > self.scene.max_scale {
            return Err(WifiScopeError::ConfigValidation(format!(
                "scene scale bounds invalid: min {} max {}",
                self.scene.min_scale, self.scene.max_scale
            )));
        }
        if self.classification.warning_dbm > self.classification.good_dbm {
            return Err(WifiScopeError::ConfigValidation(format!(
                "classification.warning_dbm ({}) must not exceed good_dbm ({})",
                self.classification.warning_dbm, self.classification.good_dbm
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.sampling.sample_interval_ms, 2000);
        assert_eq!(config.connectivity.check_interval_ms, 5000);
        assert!(config.connectivity.require_wifi);
        assert_eq!(config.scene.fov_degrees, 75.0);
        assert_eq!(config.scene.reference_distance, 5.0);
        assert_eq!(config.scene.min_scale, 0.5);
        assert_eq!(config.scene.max_scale, 2.0);
        assert_eq!(config.classification.good_dbm, -50.0);
        assert_eq!(config.classification.warning_dbm, -70.0);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sampling.sample_interval_ms, 2000);
        assert!(!config.sampling.synthetic);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml = r#"
            [sampling]
            sample_interval_ms = 500
            synthetic = true

            [classification]
            warning_dbm = -75.0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sampling.sample_interval_ms, 500);
        assert!(config.sampling.synthetic);
        assert_eq!(config.classification.warning_dbm, -75.0);
        // Untouched sections keep their defaults
        assert_eq!(config.scene.reference_distance, 5.0);
    }

    #[test]
    fn test_zero_sample_interval_rejected() {
        let mut config = Config::default();
        config.sampling.sample_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(WifiScopeError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_inverted_scale_bounds_rejected() {
        let mut config = Config::default();
        config.scene.min_scale = 3.0;
        config.scene.max_scale = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = Config::default();
        config.classification.good_dbm = -80.0;
        config.classification.warning_dbm = -50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_fov_rejected() {
        let mut config = Config::default();
        config.scene.fov_degrees = 180.0;
        assert!(config.validate().is_err());
        config.scene.fov_degrees = 0.0;
        assert!(config.validate().is_err());
    }
}
