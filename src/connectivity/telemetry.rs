//! Capability-checked adapter over the host's network telemetry API.
//!
//! Hosts differ: some expose a full descriptor with link type and downlink,
//! some only expose an online/offline bit, some expose nothing. Rather than
//! branching at every call site, the adapter is selected once at startup and
//! the rest of the core talks to [`NetworkTelemetry`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ConnectionDescriptor;

/// Read-only view of host network telemetry.
#[async_trait]
pub trait NetworkTelemetry: Send + Sync {
    /// Whether the host exposes a telemetry descriptor at all.
    fn is_supported(&self) -> bool;

    /// Current reachability. `true` when the host believes it has a route
    /// to the network, independent of link type.
    async fn is_online(&self) -> bool;

    /// Current link descriptor, absent on unsupported hosts.
    async fn descriptor(&self) -> Option<ConnectionDescriptor>;

    /// Current network name, when the host exposes one.
    async fn ssid(&self) -> Option<String> {
        None
    }
}

/// Explicit adapter for hosts with no telemetry API.
///
/// Reports online (reachability unknown is treated as reachable) and no
/// descriptor, which downstream degrades to synthetic or default sampling.
#[derive(Debug, Default, Clone)]
pub struct UnsupportedTelemetry;

#[async_trait]
impl NetworkTelemetry for UnsupportedTelemetry {
    fn is_supported(&self) -> bool {
        false
    }

    async fn is_online(&self) -> bool {
        true
    }

    async fn descriptor(&self) -> Option<ConnectionDescriptor> {
        None
    }
}

/// A host telemetry snapshot: reachability plus an optional descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub online: bool,
    pub descriptor: Option<ConnectionDescriptor>,
    pub ssid: Option<String>,
}

impl HostSnapshot {
    #[must_use]
    pub fn offline() -> Self {
        Self {
            online: false,
            descriptor: None,
            ssid: None,
        }
    }

    #[must_use]
    pub fn online_with(descriptor: ConnectionDescriptor) -> Self {
        Self {
            online: true,
            descriptor: Some(descriptor),
            ssid: None,
        }
    }
}

/// [`NetworkTelemetry`] backed by a mutable snapshot.
///
/// The canonical implementation for hosts that push telemetry into the core
/// (and the workhorse for tests): the host updates the snapshot from its
/// platform events, the core reads it on each poll.
#[derive(Debug, Clone)]
pub struct StaticTelemetry {
    snapshot: Arc<Mutex<HostSnapshot>>,
}

impl StaticTelemetry {
    #[must_use]
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Replace the snapshot. The next poll observes the new state.
    pub fn set(&self, snapshot: HostSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }
}

#[async_trait]
impl NetworkTelemetry for StaticTelemetry {
    fn is_supported(&self) -> bool {
        true
    }

    async fn is_online(&self) -> bool {
        self.snapshot.lock().unwrap().online
    }

    async fn descriptor(&self) -> Option<ConnectionDescriptor> {
        self.snapshot.lock().unwrap().descriptor.clone()
    }

    async fn ssid(&self) -> Option<String> {
        self.snapshot.lock().unwrap().ssid.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{EffectiveClass, LinkType};

    #[tokio::test]
    async fn test_unsupported_reports_no_descriptor() {
        let telemetry = UnsupportedTelemetry;
        assert!(!telemetry.is_supported());
        assert!(telemetry.is_online().await);
        assert!(telemetry.descriptor().await.is_none());
        assert!(telemetry.ssid().await.is_none());
    }

    #[tokio::test]
    async fn test_static_telemetry_reflects_snapshot_updates() {
        let telemetry = StaticTelemetry::new(HostSnapshot::offline());
        assert!(!telemetry.is_online().await);

        telemetry.set(HostSnapshot::online_with(ConnectionDescriptor {
            link_type: LinkType::Wifi,
            effective_class: EffectiveClass::Class4g,
            downlink: 50.0,
            downlink_max: Some(150.0),
            rtt_ms: 30.0,
        }));
        assert!(telemetry.is_online().await);
        let descriptor = telemetry.descriptor().await.unwrap();
        assert_eq!(descriptor.link_type, LinkType::Wifi);
        assert_eq!(descriptor.downlink, 50.0);
    }
}
