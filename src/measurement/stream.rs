//! The measurement stream: fixed-cadence sampling, append-only history,
//! subscriber fan-out.
//!
//! One [`MeasurementStream`] instance is owned by the composition root.
//! Sampling is gated by the connectivity monitor; signal figures come from
//! the injected [`SamplerStrategy`]; latency comes from timing one capped
//! round trip against the persistence backend.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use glam::Vec3;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connectivity::ConnectivityMonitor;
use crate::error::{Result, WifiScopeError};
use crate::measurement::bus::{SubscriberId, SubscriptionBus};
use crate::measurement::record::MeasurementRecord;
use crate::measurement::sampler::SamplerStrategy;
use crate::persistence::PersistenceBackend;

/// Samples network telemetry, keeps the ordered history, and fans records
/// out to subscribers.
pub struct MeasurementStream {
    sampler: Arc<dyn SamplerStrategy>,
    monitor: Arc<ConnectivityMonitor>,
    backend: Arc<dyn PersistenceBackend>,
    bus: SubscriptionBus<MeasurementRecord>,
    history: Mutex<Vec<MeasurementRecord>>,
    /// Last issued timestamp; keeps the history monotonically non-decreasing
    /// even if the wall clock steps backwards.
    last_timestamp: Mutex<i64>,
    probe_timeout: Duration,
}

impl MeasurementStream {
    /// Create a stream.
    ///
    /// # Arguments
    ///
    /// * `sampler` - Strategy producing signal/speed figures
    /// * `monitor` - Connectivity gate and descriptor source
    /// * `backend` - Latency-probe target
    /// * `probe_timeout` - Cap on the latency probe; a stalled backend only
    ///   costs this much of a tick, never the cadence
    #[must_use]
    pub fn new(
        sampler: Arc<dyn SamplerStrategy>,
        monitor: Arc<ConnectivityMonitor>,
        backend: Arc<dyn PersistenceBackend>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            sampler,
            monitor,
            backend,
            bus: SubscriptionBus::new(),
            history: Mutex::new(Vec::new()),
            last_timestamp: Mutex::new(0),
            probe_timeout,
        }
    }

    /// Take one measurement now: sample, append to history, publish.
    ///
    /// # Errors
    ///
    /// * `Connectivity` - The monitor reports sampling is blocked
    /// * Any error of the injected sampler strategy
    pub async fn sample_once(&self) -> Result<MeasurementRecord> {
        if !self.monitor.is_connected() {
            return Err(WifiScopeError::Connectivity(
                "sampling blocked: no usable connection".to_string(),
            ));
        }

        let latency = self.probe_latency().await;
        let descriptor = self.monitor.connection();
        let raw = self.sampler.sample(descriptor.as_ref()).await?;

        let record = MeasurementRecord {
            signal_strength: raw.signal_strength,
            speed: raw.speed.max(0.0),
            latency,
            timestamp: self.next_timestamp(),
            location: Vec3::ZERO,
        };

        self.history.lock().unwrap().push(record.clone());
        self.bus.publish(&record);
        debug!(
            signal = record.signal_strength,
            speed = record.speed,
            latency = record.latency,
            "sampled measurement"
        );
        Ok(record)
    }

    /// Time one capped round trip against the persistence backend.
    ///
    /// Probe failures are absorbed: a timeout or backend error still yields
    /// the elapsed time, so a degraded backend shows up as high latency
    /// rather than a failed sample.
    async fn probe_latency(&self) -> f64 {
        let start = Instant::now();
        match tokio::time::timeout(self.probe_timeout, self.backend.health_check()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("latency probe failed: {}", e),
            Err(_) => warn!(
                "latency probe timed out after {}ms",
                self.probe_timeout.as_millis()
            ),
        }
        start.elapsed().as_secs_f64() * 1000.0
    }

    /// Wall-clock milliseconds, clamped to be non-decreasing.
    fn next_timestamp(&self) -> i64 {
        let mut last = self.last_timestamp.lock().unwrap();
        let now = Utc::now().timestamp_millis();
        let ts = now.max(*last);
        *last = ts;
        ts
    }

    /// Append-only snapshot of every record sampled this session.
    #[must_use]
    pub fn history(&self) -> Vec<MeasurementRecord> {
        self.history.lock().unwrap().clone()
    }

    /// Records with `signal_strength >= min_signal`.
    ///
    /// Non-destructive and idempotent: the history is never mutated, and
    /// filtering an already filtered result with the same threshold returns
    /// it unchanged.
    #[must_use]
    pub fn filter(&self, min_signal: f64) -> Vec<MeasurementRecord> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.signal_strength >= min_signal)
            .cloned()
            .collect()
    }

    /// Register a callback for every published record.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&MeasurementRecord) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    /// Remove a subscription; `true` exactly once per token.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Drop all subscriptions. Used by teardown.
    pub fn clear_subscribers(&self) {
        self.bus.clear();
    }

    /// Spawn the fixed-cadence sampling loop.
    ///
    /// Each tick takes one sample; blocked or failed ticks are logged and
    /// skipped, never ending the loop. The returned handle is aborted by
    /// teardown.
    pub fn spawn_sampling(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let stream = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match stream.sample_once().await {
                    Ok(record) => {
                        debug!(timestamp = record.timestamp, "tick sampled");
                    }
                    Err(WifiScopeError::Connectivity(_)) => {
                        debug!("tick skipped: sampling blocked");
                    }
                    Err(e) => {
                        warn!("tick failed: {}", e);
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for MeasurementStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementStream")
            .field("history_len", &self.history.lock().unwrap().len())
            .field("subscribers", &self.bus.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::telemetry::{HostSnapshot, StaticTelemetry};
    use crate::connectivity::{ConnectionDescriptor, EffectiveClass, LinkType};
    use crate::measurement::sampler::{RealSampler, SyntheticSampler};
    use crate::notify::RecordingNotifier;
    use crate::persistence::MemoryBackend;

    fn wifi_descriptor(downlink: f64) -> ConnectionDescriptor {
        ConnectionDescriptor {
            link_type: LinkType::Wifi,
            effective_class: EffectiveClass::Class4g,
            downlink,
            downlink_max: None,
            rtt_ms: 20.0,
        }
    }

    struct Fixture {
        stream: Arc<MeasurementStream>,
        telemetry: StaticTelemetry,
        monitor: Arc<ConnectivityMonitor>,
        backend: Arc<MemoryBackend>,
    }

    async fn fixture(sampler: Arc<dyn SamplerStrategy>) -> Fixture {
        let telemetry = StaticTelemetry::new(HostSnapshot::online_with(wifi_descriptor(80.0)));
        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::new(telemetry.clone()),
            Arc::new(RecordingNotifier::new()),
            true,
        ));
        monitor.initialize().await.unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let stream = Arc::new(MeasurementStream::new(
            sampler,
            Arc::clone(&monitor),
            Arc::clone(&backend) as Arc<dyn PersistenceBackend>,
            Duration::from_millis(200),
        ));
        Fixture {
            stream,
            telemetry,
            monitor,
            backend,
        }
    }

    #[tokio::test]
    async fn test_sample_once_produces_nonnegative_figures() {
        let f = fixture(Arc::new(RealSampler)).await;
        let record = f.stream.sample_once().await.unwrap();
        assert!(record.speed >= 0.0);
        assert!(record.latency >= 0.0);
        // 4g base -50, 80 Mbps -> +15 capped
        assert_eq!(record.signal_strength, -35.0);
    }

    #[tokio::test]
    async fn test_history_is_append_only() {
        let f = fixture(Arc::new(SyntheticSampler::default())).await;
        f.stream.sample_once().await.unwrap();
        let first = f.stream.history();
        f.stream.sample_once().await.unwrap();
        f.stream.sample_once().await.unwrap();
        let later = f.stream.history();

        assert_eq!(later.len(), 3);
        // Earlier snapshot is a prefix of any later one
        assert_eq!(&later[..first.len()], first.as_slice());
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing() {
        let f = fixture(Arc::new(SyntheticSampler::default())).await;
        for _ in 0..5 {
            f.stream.sample_once().await.unwrap();
        }
        let history = f.stream.history();
        for pair in history.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }

    #[tokio::test]
    async fn test_filter_is_exact_suffix_and_idempotent() {
        let sampler = Arc::new(RealSampler);
        let f = fixture(sampler).await;

        // Three distinct signal levels via descriptor downlink
        for downlink in [0.0, 30.0, 80.0] {
            f.telemetry
                .set(HostSnapshot::online_with(wifi_descriptor(downlink)));
            f.monitor.check_now().await;
            f.stream.sample_once().await.unwrap();
        }
        // Signals: -50, -44, -35
        let filtered = f.stream.filter(-45.0);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.signal_strength >= -45.0));

        // Idempotent: filtering the filtered set again changes nothing
        let refiltered: Vec<_> = filtered
            .iter()
            .filter(|r| r.signal_strength >= -45.0)
            .cloned()
            .collect();
        assert_eq!(refiltered, filtered);

        // Non-destructive: history untouched
        assert_eq!(f.stream.history().len(), 3);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber_and_unsubscribe_stops_it() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let f = fixture(Arc::new(SyntheticSampler::default())).await;

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let id = f.stream.subscribe(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        f.stream.sample_once().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(f.stream.unsubscribe(id));
        f.stream.sample_once().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sampling_blocked_while_disconnected() {
        let f = fixture(Arc::new(SyntheticSampler::default())).await;
        f.telemetry.set(HostSnapshot::offline());
        f.monitor.check_now().await;

        let result = f.stream.sample_once().await;
        assert!(matches!(result, Err(WifiScopeError::Connectivity(_))));
        assert!(f.stream.history().is_empty());

        // Reconnect; the next sample goes through
        f.telemetry
            .set(HostSnapshot::online_with(wifi_descriptor(50.0)));
        f.monitor.check_now().await;
        assert!(f.stream.sample_once().await.is_ok());
        assert_eq!(f.stream.history().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_probe_is_capped_not_fatal() {
        let f = fixture(Arc::new(SyntheticSampler::default())).await;
        // Backend stalls well past the 200ms probe cap
        f.backend.set_health_delay_ms(10_000);

        let start = Instant::now();
        let record = f.stream.sample_once().await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
        // Latency reports roughly the cap, not the stall
        assert!(record.latency >= 200.0);
        assert!(record.latency < 2000.0);
    }

    #[tokio::test]
    async fn test_sampling_loop_ticks_and_aborts() {
        let f = fixture(Arc::new(SyntheticSampler::default())).await;
        let handle = f.stream.spawn_sampling(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();
        let sampled = f.stream.history().len();
        assert!(sampled >= 2, "expected several ticks, got {}", sampled);

        // After abort, no further samples appear
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(f.stream.history().len(), sampled);
    }
}
