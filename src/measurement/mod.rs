//! # Measurement Module
//!
//! Network-quality sampling and streaming.
//!
//! This module handles:
//! - Building immutable measurement records and classifying signal quality
//! - Sampling strategies (host telemetry vs synthetic)
//! - The fixed-cadence sampling loop with its append-only history
//! - Publish/subscribe fan-out of new records

pub mod bus;
pub mod record;
pub mod sampler;
pub mod stream;

pub use bus::{SubscriberId, SubscriptionBus};
pub use record::{MeasurementRecord, SignalQuality};
pub use sampler::{RawSample, RealSampler, SamplerStrategy, SyntheticSampler};
pub use stream::MeasurementStream;
