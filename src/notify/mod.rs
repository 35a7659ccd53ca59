//! # Notification Module
//!
//! Seam between the core and whatever toast/alert surface the host UI
//! provides. The core never renders notifications itself; it only reports
//! them through [`Notifier`].
//!
//! Two severities matter here:
//! - **persistent** - stays up until explicitly cleared (connectivity loss)
//! - **transient** - fire-and-forget (a failed persistence write)

use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

/// Notification sink implemented by the host UI layer.
pub trait Notifier: Send + Sync {
    /// Raise an error that stays visible until [`clear_persistent`] is
    /// called. Raised at most once per underlying condition.
    ///
    /// [`clear_persistent`]: Notifier::clear_persistent
    fn persistent_error(&self, message: &str);

    /// Clear the currently raised persistent error, if any.
    fn clear_persistent(&self);

    /// Raise a self-dismissing error.
    fn transient_error(&self, message: &str);

    /// Informational message.
    fn info(&self, message: &str);
}

/// [`Notifier`] that forwards everything to the `tracing` subscriber.
///
/// The default sink when no UI layer is attached.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn persistent_error(&self, message: &str) {
        error!(persistent = true, "{}", message);
    }

    fn clear_persistent(&self) {
        info!("persistent error cleared");
    }

    fn transient_error(&self, message: &str) {
        warn!("{}", message);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }
}

/// A recorded notification, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PersistentError(String),
    ClearPersistent,
    TransientError(String),
    Info(String),
}

/// Capturing [`Notifier`] for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }

    /// Count of persistent errors raised.
    pub fn persistent_error_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Notification::PersistentError(_)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn persistent_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Notification::PersistentError(message.to_string()));
    }

    fn clear_persistent(&self) {
        self.events.lock().unwrap().push(Notification::ClearPersistent);
    }

    fn transient_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Notification::TransientError(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Notification::Info(message.to_string()));
    }
}
