//! # Measurement Records
//!
//! The immutable measurement record and signal-quality classification.
//!
//! ## Classification
//!
//! One canonical three-tier table over signal strength in dBm:
//!
//! | Signal | Quality |
//! |--------|---------|
//! | `>= -50` | Good |
//! | `>= -70` | Warning |
//! | `< -70` | Poor |

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Signal strength at or above this value classifies as [`SignalQuality::Good`].
pub const GOOD_SIGNAL_DBM: f64 = -50.0;

/// Signal strength at or above this value (but below [`GOOD_SIGNAL_DBM`])
/// classifies as [`SignalQuality::Warning`].
pub const WARNING_SIGNAL_DBM: f64 = -70.0;

/// One network-quality sample. Immutable once created.
///
/// Produced either by the periodic sampler tick or by an explicit on-demand
/// call; appended to the measurement history and fanned out to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Received signal power in dBm; more negative is weaker.
    /// Conventionally in [-100, -30].
    pub signal_strength: f64,
    /// Estimated downlink throughput in Mbps. Never negative.
    pub speed: f64,
    /// Round-trip latency in milliseconds. Never negative.
    pub latency: f64,
    /// Wall-clock milliseconds; monotonically non-decreasing across the
    /// history.
    pub timestamp: i64,
    /// World position the sample was taken at.
    #[serde(with = "vec3_xyz")]
    pub location: Vec3,
}

impl MeasurementRecord {
    /// Classify this record's signal strength.
    #[must_use]
    pub fn quality(&self) -> SignalQuality {
        SignalQuality::classify(self.signal_strength)
    }
}

/// Coarse quality tier derived from signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalQuality {
    Good,
    Warning,
    Poor,
}

impl SignalQuality {
    /// Classify a signal strength in dBm.
    ///
    /// Pure function of its argument; the thresholds are the canonical
    /// table in the module docs.
    ///
    /// # Examples
    ///
    /// ```
    /// use wifi_scope::measurement::record::SignalQuality;
    ///
    /// assert_eq!(SignalQuality::classify(-45.0), SignalQuality::Good);
    /// assert_eq!(SignalQuality::classify(-68.0), SignalQuality::Warning);
    /// assert_eq!(SignalQuality::classify(-80.0), SignalQuality::Poor);
    /// ```
    #[must_use]
    pub fn classify(signal_strength: f64) -> Self {
        if signal_strength >= GOOD_SIGNAL_DBM {
            SignalQuality::Good
        } else if signal_strength >= WARNING_SIGNAL_DBM {
            SignalQuality::Warning
        } else {
            SignalQuality::Poor
        }
    }

    /// Classify against configurable thresholds.
    ///
    /// `good_dbm` and `warning_dbm` come from
    /// [`ClassificationConfig`](crate::config::ClassificationConfig);
    /// `classify` is this with the canonical constants.
    #[must_use]
    pub fn classify_with(signal_strength: f64, good_dbm: f64, warning_dbm: f64) -> Self {
        if signal_strength >= good_dbm {
            SignalQuality::Good
        } else if signal_strength >= warning_dbm {
            SignalQuality::Warning
        } else {
            SignalQuality::Poor
        }
    }

    /// Marker mesh color for this tier, as 0xRRGGBB.
    #[must_use]
    pub fn color(self) -> u32 {
        match self {
            SignalQuality::Good => 0x4ade80,    // Green
            SignalQuality::Warning => 0xfbbf24, // Yellow
            SignalQuality::Poor => 0xef4444,    // Red
        }
    }

    /// Label background for this tier, as a CSS rgba string.
    #[must_use]
    pub fn label_background(self) -> &'static str {
        match self {
            SignalQuality::Good => "rgba(74, 222, 128, 0.9)",
            SignalQuality::Warning => "rgba(251, 191, 36, 0.9)",
            SignalQuality::Poor => "rgba(239, 68, 68, 0.9)",
        }
    }
}

/// Serde adapter storing a [`Vec3`] as `{ x, y, z }`.
mod vec3_xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec3, s: S) -> Result<S::Ok, S::Error> {
        Xyz { x: v.x, y: v.y, z: v.z }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec3, D::Error> {
        let xyz = Xyz::deserialize(d)?;
        Ok(Vec3::new(xyz.x, xyz.y, xyz.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(signal: f64) -> MeasurementRecord {
        MeasurementRecord {
            signal_strength: signal,
            speed: 80.0,
            latency: 25.0,
            timestamp: 1_700_000_000_000,
            location: Vec3::ZERO,
        }
    }

    #[test]
    fn test_canonical_classification_examples() {
        assert_eq!(SignalQuality::classify(-45.0), SignalQuality::Good);
        assert_eq!(SignalQuality::classify(-68.0), SignalQuality::Warning);
        assert_eq!(SignalQuality::classify(-80.0), SignalQuality::Poor);
    }

    #[test]
    fn test_classification_boundaries_inclusive() {
        // Thresholds are >= comparisons
        assert_eq!(SignalQuality::classify(-50.0), SignalQuality::Good);
        assert_eq!(SignalQuality::classify(-50.01), SignalQuality::Warning);
        assert_eq!(SignalQuality::classify(-70.0), SignalQuality::Warning);
        assert_eq!(SignalQuality::classify(-70.01), SignalQuality::Poor);
    }

    #[test]
    fn test_classify_with_custom_thresholds() {
        assert_eq!(
            SignalQuality::classify_with(-60.0, -55.0, -65.0),
            SignalQuality::Warning
        );
        assert_eq!(
            SignalQuality::classify_with(-50.0, -55.0, -65.0),
            SignalQuality::Good
        );
    }

    #[test]
    fn test_record_quality_delegates_to_classify() {
        assert_eq!(record(-45.0).quality(), SignalQuality::Good);
        assert_eq!(record(-95.0).quality(), SignalQuality::Poor);
    }

    #[test]
    fn test_quality_colors() {
        assert_eq!(SignalQuality::Good.color(), 0x4ade80);
        assert_eq!(SignalQuality::Warning.color(), 0xfbbf24);
        assert_eq!(SignalQuality::Poor.color(), 0xef4444);
    }

    #[test]
    fn test_record_serde_round_trip() {
        let rec = record(-65.0);
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"signal_strength\":-65.0"));
        assert!(json.contains("\"x\":0.0"));
        let back: MeasurementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
