//! Sampling strategies.
//!
//! The stream does not care where signal figures come from: it asks a
//! [`SamplerStrategy`] chosen once at startup. [`RealSampler`] derives them
//! from the host's connection descriptor (degrading to a default WiFi
//! profile when none is reported); [`SyntheticSampler`] generates plausible
//! figures for demos and tests.

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::connectivity::{ConnectionDescriptor, EffectiveClass};
use crate::error::Result;

/// Raw signal/speed figures produced by one sampling call.
///
/// Latency and timestamp are filled in by the stream, which owns the
/// latency probe and the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub signal_strength: f64,
    pub speed: f64,
}

/// Source of signal/speed figures, injected into the stream.
#[async_trait]
pub trait SamplerStrategy: Send + Sync {
    /// Produce one sample from the current descriptor.
    ///
    /// A missing descriptor is not an error for the built-in strategies:
    /// they degrade to default or generated figures instead of failing.
    ///
    /// # Errors
    ///
    /// Implementations backed by an external source may fail to reach it.
    async fn sample(&self, descriptor: Option<&ConnectionDescriptor>) -> Result<RawSample>;
}

/// Base signal strength in dBm for each effective link class.
fn base_signal_dbm(class: EffectiveClass) -> f64 {
    match class {
        EffectiveClass::Class4g => -50.0,
        EffectiveClass::Class3g => -70.0,
        EffectiveClass::Class2g => -85.0,
        EffectiveClass::Slow2g => -95.0,
    }
}

/// Derives signal strength from the host descriptor.
///
/// Hosts report no dBm figure directly, so the sampler estimates one: a base
/// value per effective class, nudged up by measured downlink speed. The
/// adjustment is `min(15, floor(downlink / 10) * 2)` dBm.
///
/// # Examples
///
/// ```
/// use wifi_scope::measurement::sampler::RealSampler;
/// use wifi_scope::connectivity::ConnectionDescriptor;
///
/// // 4g base -50 dBm; a 30 Mbps downlink adds floor(30/10)*2 = 6
/// let mut descriptor = ConnectionDescriptor::default_wifi();
/// descriptor.downlink = 30.0;
/// assert_eq!(RealSampler::signal_from(&descriptor), -44.0);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RealSampler;

impl RealSampler {
    /// Estimate signal strength in dBm from a descriptor.
    #[must_use]
    pub fn signal_from(descriptor: &ConnectionDescriptor) -> f64 {
        let base = base_signal_dbm(descriptor.effective_class);
        let adjustment = ((descriptor.downlink / 10.0).floor() * 2.0).min(15.0);
        base + adjustment
    }
}

#[async_trait]
impl SamplerStrategy for RealSampler {
    /// Samples from the descriptor, or from [`ConnectionDescriptor::default_wifi`]
    /// when the host reports none.
    async fn sample(&self, descriptor: Option<&ConnectionDescriptor>) -> Result<RawSample> {
        let fallback;
        let descriptor = match descriptor {
            Some(descriptor) => descriptor,
            None => {
                debug!("no connection descriptor, sampling from the default WiFi profile");
                fallback = ConnectionDescriptor::default_wifi();
                &fallback
            }
        };
        Ok(RawSample {
            signal_strength: Self::signal_from(descriptor),
            speed: descriptor.downlink.max(0.0),
        })
    }
}

/// Generates plausible figures without any host telemetry.
#[derive(Debug, Clone)]
pub struct SyntheticSampler {
    /// Inclusive dBm range for generated signal strength.
    pub signal_range: (f64, f64),
    /// Inclusive Mbps range for generated speed.
    pub speed_range: (f64, f64),
}

impl Default for SyntheticSampler {
    fn default() -> Self {
        Self {
            signal_range: (-90.0, -40.0),
            speed_range: (5.0, 100.0),
        }
    }
}

#[async_trait]
impl SamplerStrategy for SyntheticSampler {
    async fn sample(&self, _descriptor: Option<&ConnectionDescriptor>) -> Result<RawSample> {
        let mut rng = rand::thread_rng();
        Ok(RawSample {
            signal_strength: rng.gen_range(self.signal_range.0..=self.signal_range.1),
            speed: rng.gen_range(self.speed_range.0..=self.speed_range.1),
        })
    }
}
