//! # Composition Root
//!
//! Wires the monitor, stream, projector, marker store, scene manager, and
//! persistence seam into one explicitly constructed [`WifiScope`] instance.
//! Every collaborator is injected; nothing here is a process-wide global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glam::Vec2;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::connectivity::{
    AdapterInfo, ConnectionDescriptor, ConnectivityMonitor, NetworkTelemetry, UnsupportedTelemetry,
};
use crate::error::{Result, WifiScopeError};
use crate::measurement::record::MeasurementRecord;
use crate::measurement::sampler::{RealSampler, SamplerStrategy, SyntheticSampler};
use crate::measurement::stream::MeasurementStream;
use crate::measurement::SubscriberId;
use crate::notify::{LogNotifier, Notifier};
use crate::persistence::{ClientMetadata, MemoryBackend, PersistenceBackend, StoredRecord};
use crate::scene::manager::RenderTarget;
use crate::scene::{
    MarkerFactory, MarkerId, MarkerStore, NullRenderTarget, SceneManager, SpatialProjector,
};

/// Injected collaborators for [`WifiScope::new`].
pub struct WifiScopeParts {
    pub telemetry: Arc<dyn NetworkTelemetry>,
    pub notifier: Arc<dyn Notifier>,
    pub backend: Arc<dyn PersistenceBackend>,
    pub sampler: Arc<dyn SamplerStrategy>,
    pub render_target: Box<dyn RenderTarget>,
}

impl WifiScopeParts {
    /// Default collaborators: no host telemetry, log-backed notifications,
    /// in-memory persistence, no drawing layer. The sampler follows
    /// `config.sampling.synthetic`; without host telemetry the real sampler
    /// falls back to the default WiFi profile.
    #[must_use]
    pub fn defaults(config: &Config) -> Self {
        let sampler: Arc<dyn SamplerStrategy> = if config.sampling.synthetic {
            Arc::new(SyntheticSampler::default())
        } else {
            Arc::new(RealSampler)
        };
        Self {
            telemetry: Arc::new(UnsupportedTelemetry),
            notifier: Arc::new(LogNotifier),
            backend: Arc::new(MemoryBackend::new()),
            sampler,
            render_target: Box::new(NullRenderTarget),
        }
    }
}

/// The public core: measurement streaming plus spatial annotation.
pub struct WifiScope {
    config: Config,
    telemetry: Arc<dyn NetworkTelemetry>,
    notifier: Arc<dyn Notifier>,
    backend: Arc<dyn PersistenceBackend>,
    monitor: Arc<ConnectivityMonitor>,
    stream: Arc<MeasurementStream>,
    store: Arc<MarkerStore>,
    factory: MarkerFactory,
    projector: SpatialProjector,
    scene: SceneManager,
    sampling_task: Mutex<Option<JoinHandle<()>>>,
    check_task: Mutex<Option<JoinHandle<()>>>,
    cleaned: AtomicBool,
}

impl WifiScope {
    /// Assemble a core from explicit parts.
    #[must_use]
    pub fn new(config: Config, parts: WifiScopeParts) -> Self {
        let monitor = Arc::new(ConnectivityMonitor::new(
            Arc::clone(&parts.telemetry),
            Arc::clone(&parts.notifier),
            config.connectivity.require_wifi,
        ));
        let stream = Arc::new(MeasurementStream::new(
            parts.sampler,
            Arc::clone(&monitor),
            Arc::clone(&parts.backend),
            Duration::from_millis(config.sampling.latency_probe_timeout_ms),
        ));
        let store = Arc::new(MarkerStore::new());
        let factory = MarkerFactory::with_thresholds(
            config.classification.good_dbm,
            config.classification.warning_dbm,
        );
        let projector = SpatialProjector::new(config.scene.reference_distance);
        let scene = SceneManager::new(
            config.scene.clone(),
            Arc::clone(&store),
            parts.render_target,
        );
        Self {
            telemetry: parts.telemetry,
            notifier: parts.notifier,
            backend: parts.backend,
            monitor,
            stream,
            store,
            factory,
            projector,
            scene,
            sampling_task: Mutex::new(None),
            check_task: Mutex::new(None),
            cleaned: AtomicBool::new(false),
            config,
        }
    }

    /// Assemble a core with [`WifiScopeParts::defaults`].
    #[must_use]
    pub fn with_defaults(config: Config) -> Self {
        let parts = WifiScopeParts::defaults(&config);
        Self::new(config, parts)
    }

    /// Run the startup connectivity check and spawn the sampling and
    /// re-check loops.
    ///
    /// # Errors
    ///
    /// Returns `Connectivity` when the startup check fails; no loops are
    /// left running in that case, and `cleanup` remains safe to call.
    pub async fn initialize(&self) -> Result<()> {
        self.monitor.initialize().await?;

        let sampling = self
            .stream
            .spawn_sampling(Duration::from_millis(self.config.sampling.sample_interval_ms));
        *self.sampling_task.lock().unwrap() = Some(sampling);

        let monitor = Arc::clone(&self.monitor);
        let check_interval = Duration::from_millis(self.config.connectivity.check_interval_ms);
        let check = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                monitor.check_now().await;
            }
        });
        *self.check_task.lock().unwrap() = Some(check);

        info!(
            sample_interval_ms = self.config.sampling.sample_interval_ms,
            check_interval_ms = self.config.connectivity.check_interval_ms,
            "wifi scope initialized"
        );
        Ok(())
    }

    /// Register a callback for every published measurement.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&MeasurementRecord) + Send + Sync + 'static,
    {
        self.stream.subscribe(callback)
    }

    /// Remove a subscription; `true` exactly once per token.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.stream.unsubscribe(id)
    }

    /// Take one measurement on demand.
    ///
    /// # Errors
    ///
    /// Propagates `Connectivity` (and any sampler error) from the stream.
    pub async fn measure_now(&self) -> Result<MeasurementRecord> {
        self.stream.sample_once().await
    }

    /// Append-only measurement history.
    #[must_use]
    pub fn history(&self) -> Vec<MeasurementRecord> {
        self.stream.history()
    }

    /// Records with `signal_strength >= min_signal`.
    #[must_use]
    pub fn filter(&self, min_signal: f64) -> Vec<MeasurementRecord> {
        self.stream.filter(min_signal)
    }

    /// Current connection descriptor, absent on unsupported hosts.
    #[must_use]
    pub fn connection_info(&self) -> Option<ConnectionDescriptor> {
        self.monitor.connection()
    }

    /// Human-readable adapter summary.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryUnavailable` when the host reports no descriptor.
    pub async fn adapter_info(&self) -> Result<AdapterInfo> {
        let descriptor = self.monitor.connection().ok_or_else(|| {
            WifiScopeError::TelemetryUnavailable("no connection descriptor".to_string())
        })?;
        let ssid = self.telemetry.ssid().await;
        Ok(AdapterInfo::from_descriptor(&descriptor, ssid.as_deref()))
    }

    /// Place a marker for `record` at the world position resolved from a
    /// screen point.
    ///
    /// Existing markers are raycast targets, so tapping one stacks the new
    /// marker on its surface; an empty scene falls back to the fixed
    /// reference depth.
    ///
    /// # Errors
    ///
    /// `Projection` only if a custom strategy chain declines the point.
    pub fn add_marker(&self, screen: Vec2, record: MeasurementRecord) -> Result<MarkerId> {
        let camera = self.scene.camera();
        let position = self
            .projector
            .resolve(&camera, screen, &self.store.colliders())?;
        let marker = self.factory.create(position, record);
        let id = self.store.insert(marker);
        info!(%id, ?position, "marker placed");
        Ok(id)
    }

    /// Run the per-frame billboard/rescale pass without rendering.
    pub fn update_marker_scales(&self) {
        self.scene.update_pass();
    }

    /// Render one frame.
    pub fn render(&self) {
        self.scene.render();
    }

    /// Marker store, for read access by the UI layer.
    #[must_use]
    pub fn markers(&self) -> &Arc<MarkerStore> {
        &self.store
    }

    /// Scene manager, for resize and orbit input forwarding.
    #[must_use]
    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    /// Persist a measurement with its location label and client details.
    ///
    /// # Errors
    ///
    /// `Persistence` on backend failure; a transient notification is raised
    /// and in-memory state is untouched.
    pub async fn store_measurement(
        &self,
        record: &MeasurementRecord,
        location_name: &str,
        client_id: &str,
        metadata: Option<&ClientMetadata>,
    ) -> Result<StoredRecord> {
        if !self.config.persistence.enabled {
            return Err(WifiScopeError::Persistence(
                "persistence is disabled by configuration".to_string(),
            ));
        }
        match self
            .backend
            .store(record, location_name, client_id, metadata)
            .await
        {
            Ok(stored) => Ok(stored),
            Err(e) => {
                warn!("failed to store measurement: {}", e);
                self.notifier
                    .transient_error("measurement could not be saved");
                Err(e)
            }
        }
    }

    /// Stored rows for one client, newest first.
    pub async fn measurements_by_client(&self, client_id: &str) -> Result<Vec<StoredRecord>> {
        self.backend.list_by_client(client_id).await
    }

    /// Scoped teardown: stop the loops, drop subscribers, clear markers,
    /// release render resources.
    ///
    /// Idempotent, and safe on every exit path including a failed
    /// `initialize`.
    pub fn cleanup(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(task) = self.sampling_task.lock().unwrap().take() {
            task.abort();
        }
        if let Some(task) = self.check_task.lock().unwrap().take() {
            task.abort();
        }
        self.stream.clear_subscribers();
        self.scene.cleanup();
        info!("wifi scope cleaned up");
    }
}

impl Drop for WifiScope {
    fn drop(&mut self) {
        self.cleanup();
    }
}
