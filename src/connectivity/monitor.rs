//! Connectivity state machine.
//!
//! `Unknown → {OnlineWifi, OnlineOther, Offline}`, driven by periodic
//! re-checks and host change events (both funnel into [`check_now`]).
//!
//! Losing connectivity - or landing on a non-WiFi link while the WiFi-only
//! contract is in force - raises exactly one persistent notification. It is
//! never auto-cleared: only a later check that observes `OnlineWifi` clears
//! the blocked state.
//!
//! [`check_now`]: ConnectivityMonitor::check_now

use std::sync::Arc;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::connectivity::{ConnectionDescriptor, LinkType, NetworkTelemetry};
use crate::error::{Result, WifiScopeError};
use crate::notify::Notifier;

/// Observed link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No check has run yet.
    Unknown,
    OnlineWifi,
    OnlineOther,
    Offline,
}

struct MonitorState {
    link: LinkState,
    /// Sampling is blocked and a persistent error is up.
    blocked: bool,
    descriptor: Option<ConnectionDescriptor>,
}

/// Watches host reachability and link type; gates sampling.
pub struct ConnectivityMonitor {
    telemetry: Arc<dyn NetworkTelemetry>,
    notifier: Arc<dyn Notifier>,
    require_wifi: bool,
    state: Mutex<MonitorState>,
}

impl ConnectivityMonitor {
    /// Create a monitor in the `Unknown` state.
    ///
    /// # Arguments
    ///
    /// * `telemetry` - Host telemetry adapter, selected once at startup
    /// * `notifier` - Notification sink for persistent errors
    /// * `require_wifi` - Treat non-WiFi links as connectivity errors
    #[must_use]
    pub fn new(
        telemetry: Arc<dyn NetworkTelemetry>,
        notifier: Arc<dyn Notifier>,
        require_wifi: bool,
    ) -> Self {
        Self {
            telemetry,
            notifier,
            require_wifi,
            state: Mutex::new(MonitorState {
                link: LinkState::Unknown,
                blocked: false,
                descriptor: None,
            }),
        }
    }

    /// Run the startup check, failing fast on an unusable link.
    ///
    /// # Errors
    ///
    /// Returns `Connectivity` if the host reports offline, or if the
    /// WiFi-only contract is in force and the link is non-WiFi.
    pub async fn initialize(&self) -> Result<()> {
        if !self.telemetry.is_supported() {
            warn!("network telemetry API not supported on this host");
        }

        let link = self.check_now().await;
        match link {
            LinkState::Offline => Err(WifiScopeError::Connectivity(
                "no internet connection".to_string(),
            )),
            LinkState::OnlineOther if self.require_wifi => Err(WifiScopeError::Connectivity(
                "device is not connected to a WiFi network".to_string(),
            )),
            _ => {
                info!("connectivity monitor initialized: {:?}", link);
                Ok(())
            }
        }
    }

    /// Poll host telemetry once and update the state machine.
    ///
    /// Called by the periodic re-check loop and by host change events.
    /// Transitions into a blocked state raise one persistent notification;
    /// observing `OnlineWifi` clears it.
    pub async fn check_now(&self) -> LinkState {
        let online = self.telemetry.is_online().await;
        let descriptor = self.telemetry.descriptor().await;

        let link = if !online {
            LinkState::Offline
        } else {
            match descriptor.as_ref().map(|d| d.link_type) {
                Some(LinkType::Wifi) => LinkState::OnlineWifi,
                Some(LinkType::Other) => LinkState::OnlineOther,
                // No descriptor (unsupported host) or unknown type: assume
                // the link is acceptable rather than blocking forever.
                Some(LinkType::Unknown) | None => LinkState::OnlineWifi,
            }
        };

        let mut state = self.state.lock().unwrap();
        let previous = state.link;
        state.link = link;
        state.descriptor = descriptor;

        let should_block = match link {
            LinkState::Offline => true,
            LinkState::OnlineOther => self.require_wifi,
            _ => false,
        };

        if should_block && !state.blocked {
            state.blocked = true;
            let message = if link == LinkState::Offline {
                "internet connection lost"
            } else {
                "device is not connected to a WiFi network"
            };
            warn!("connectivity lost: {:?} -> {:?}", previous, link);
            self.notifier.persistent_error(message);
        } else if !should_block && state.blocked && link == LinkState::OnlineWifi {
            state.blocked = false;
            info!("connectivity restored: {:?} -> {:?}", previous, link);
            self.notifier.clear_persistent();
        } else if previous != link {
            debug!("link state changed: {:?} -> {:?}", previous, link);
        }

        link
    }

    /// Whether sampling may proceed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.link {
            LinkState::OnlineWifi => true,
            LinkState::OnlineOther => !self.require_wifi,
            _ => false,
        }
    }

    /// Last observed link state.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.state.lock().unwrap().link
    }

    /// Last observed descriptor, absent on unsupported hosts.
    #[must_use]
    pub fn connection(&self) -> Option<ConnectionDescriptor> {
        self.state.lock().unwrap().descriptor.clone()
    }
}
