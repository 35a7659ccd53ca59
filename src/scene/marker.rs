//! Marker construction and ownership.
//!
//! A marker is a small colored sphere plus a text label floating just above
//! it, both anchored to the world position a measurement was taken at. The
//! store owns every live marker; the scene manager only reads them during
//! its per-frame pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use glam::{Quat, Vec3};
use tracing::debug;

use crate::measurement::record::{MeasurementRecord, SignalQuality};
use crate::scene::projector::Sphere;

/// Marker mesh radius in world units.
pub const MARKER_RADIUS: f32 = 0.15;

/// Session-unique marker identifier. Counter-derived, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker-{}", self.0)
    }
}

/// Handle to a marker's mesh in the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(u64);

/// Handle to a marker's label in the label layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelHandle(u64);

/// One live marker. Owned by [`MarkerStore`].
#[derive(Debug, Clone)]
pub struct Marker {
    pub id: MarkerId,
    pub record: MeasurementRecord,
    pub mesh: MeshHandle,
    pub label: LabelHandle,
    /// Anchor position in world space.
    pub position: Vec3,
    /// Distance-derived scale, updated each frame.
    pub scale: f32,
    /// Billboard orientation, synced to the camera each frame.
    pub orientation: Quat,
    /// Label text, e.g. `-65 dBm`.
    pub label_text: String,
    pub quality: SignalQuality,
}

impl Marker {
    /// Collider for raycast targeting.
    #[must_use]
    pub fn collider(&self) -> Sphere {
        Sphere {
            center: self.position,
            radius: MARKER_RADIUS * self.scale,
        }
    }
}

/// Builds markers from measurements.
///
/// Ids and render handles come from one session-scoped counter, so no id is
/// ever reused within a session.
#[derive(Debug)]
pub struct MarkerFactory {
    next_id: AtomicU64,
    good_dbm: f64,
    warning_dbm: f64,
}

impl Default for MarkerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerFactory {
    /// Factory with the canonical classification thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            good_dbm: crate::measurement::record::GOOD_SIGNAL_DBM,
            warning_dbm: crate::measurement::record::WARNING_SIGNAL_DBM,
        }
    }

    /// Factory with configured thresholds.
    #[must_use]
    pub fn with_thresholds(good_dbm: f64, warning_dbm: f64) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            good_dbm,
            warning_dbm,
        }
    }

    /// Build a marker for `record` anchored at `position`.
    ///
    /// Classifies the record's signal strength, colors the mesh and label
    /// accordingly, and renders the label text as a rounded dBm figure.
    #[must_use]
    pub fn create(&self, position: Vec3, record: MeasurementRecord) -> Marker {
        let serial = self.next_id.fetch_add(1, Ordering::Relaxed);
        let quality =
            SignalQuality::classify_with(record.signal_strength, self.good_dbm, self.warning_dbm);
        let label_text = format!("{} dBm", record.signal_strength.round() as i64);
        debug!(id = serial, ?quality, "created marker");
        Marker {
            id: MarkerId(serial),
            mesh: MeshHandle(serial),
            label: LabelHandle(serial),
            position,
            scale: 1.0,
            orientation: Quat::IDENTITY,
            label_text,
            quality,
            record,
        }
    }
}

/// Exclusive owner of all live markers, keyed by id.
#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Mutex<HashMap<MarkerId, Marker>>,
}

impl MarkerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a marker.
    pub fn insert(&self, marker: Marker) -> MarkerId {
        let id = marker.id;
        self.markers.lock().unwrap().insert(id, marker);
        id
    }

    /// Clone of the marker with this id, if live.
    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<Marker> {
        self.markers.lock().unwrap().get(&id).cloned()
    }

    /// Remove and return a marker, releasing its scene handles.
    pub fn remove(&self, id: MarkerId) -> Option<Marker> {
        self.markers.lock().unwrap().remove(&id)
    }

    /// Remove every marker. Scene handles are dropped with them.
    pub fn clear(&self) {
        self.markers.lock().unwrap().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Colliders of every live marker, for raycast targeting.
    #[must_use]
    pub fn colliders(&self) -> Vec<Sphere> {
        self.markers
            .lock()
            .unwrap()
            .values()
            .map(Marker::collider)
            .collect()
    }

    /// Snapshot of every live marker, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Marker> {
        let mut markers: Vec<Marker> = self.markers.lock().unwrap().values().cloned().collect();
        markers.sort_by_key(|m| m.id);
        markers
    }

    /// Apply `update` to every live marker. The per-frame pass uses this to
    /// billboard and rescale markers in place.
    pub fn update_all<F>(&self, mut update: F)
    where
        F: FnMut(&mut Marker),
    {
        for marker in self.markers.lock().unwrap().values_mut() {
            update(marker);
        }
    }
}
