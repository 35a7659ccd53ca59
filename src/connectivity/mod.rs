//! # Connectivity Module
//!
//! Watches host network reachability and link type.
//!
//! This module handles:
//! - Reading the host's network telemetry descriptor (when supported)
//! - Fail-fast initialization when the device starts offline
//! - Periodic re-checks and change-event driven checks
//! - Raising one persistent error per connectivity loss
//! - Gating the measurement sampler while the link is unusable

pub mod monitor;
pub mod telemetry;

pub use monitor::{ConnectivityMonitor, LinkState};
pub use telemetry::{HostSnapshot, NetworkTelemetry, StaticTelemetry, UnsupportedTelemetry};

use serde::{Deserialize, Serialize};

/// Coarse link type reported by host telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Wifi,
    Other,
    Unknown,
}

/// Coarse link-quality tier reported by host telemetry.
///
/// Mirrors the effective connection classes hosts commonly expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveClass {
    #[serde(rename = "4g")]
    Class4g,
    #[serde(rename = "3g")]
    Class3g,
    #[serde(rename = "2g")]
    Class2g,
    #[serde(rename = "slow-2g")]
    Slow2g,
}

/// Read-only summary of the current network link.
///
/// Refreshed in place on each poll or platform change event; never
/// historized. Absent entirely on hosts without a telemetry API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub link_type: LinkType,
    pub effective_class: EffectiveClass,
    /// Estimated downlink throughput in Mbps.
    pub downlink: f64,
    /// Advertised maximum downlink in Mbps, when the host reports one.
    pub downlink_max: Option<f64>,
    /// Host-estimated round-trip time in milliseconds.
    pub rtt_ms: f64,
}

impl ConnectionDescriptor {
    /// A neutral WiFi descriptor used by hosts that report connectivity but
    /// no link details.
    #[must_use]
    pub fn default_wifi() -> Self {
        Self {
            link_type: LinkType::Wifi,
            effective_class: EffectiveClass::Class4g,
            downlink: 0.0,
            downlink_max: None,
            rtt_ms: 0.0,
        }
    }
}

/// Human-readable WiFi adapter summary derived from the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub ssid: String,
    pub protocol: String,
    pub band: String,
    pub speed: String,
}

impl AdapterInfo {
    /// Derive adapter info from a descriptor and an optional SSID.
    ///
    /// Protocol and band are coarse guesses from the effective class and
    /// advertised maximum downlink; hosts do not expose the real values.
    #[must_use]
    pub fn from_descriptor(descriptor: &ConnectionDescriptor, ssid: Option<&str>) -> Self {
        let protocol = if descriptor.effective_class == EffectiveClass::Class4g {
            "Wi-Fi 5 (802.11ac)"
        } else {
            "Wi-Fi 4 (802.11n)"
        };
        let band = match descriptor.downlink_max {
            Some(max) if max > 100.0 => "5 GHz",
            _ => "2.4 GHz",
        };
        let speed = match descriptor.downlink_max {
            Some(max) => format!("{}/{} (Mbps)", descriptor.downlink, max),
            None => format!("{}/N/A (Mbps)", descriptor.downlink),
        };
        Self {
            ssid: ssid.unwrap_or("unknown").to_string(),
            protocol: protocol.to_string(),
            band: band.to_string(),
            speed,
        }
    }
}
