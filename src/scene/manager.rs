//! Scene ownership and the per-frame update pass.
//!
//! The manager owns the camera, the viewport, and the render seam. Once per
//! frame it re-orients every live marker to face the camera (billboarding),
//! re-anchors each label above its marker, rescales markers by distance, and
//! then draws the scene and the label layer through the [`RenderTarget`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec3;
use tracing::{debug, info};

use crate::config::SceneConfig;
use crate::scene::camera::Camera;
use crate::scene::marker::{Marker, MarkerStore, MARKER_RADIUS};

/// Render seam implemented by the host's drawing layer.
///
/// The core never touches pixels; it issues one `begin_frame` /
/// draw* / `end_frame` sequence per rendered frame.
pub trait RenderTarget: Send {
    fn begin_frame(&mut self);

    /// Draw one marker mesh.
    fn draw_marker(&mut self, marker: &Marker);

    /// Draw one label at its anchored position.
    fn draw_label(&mut self, marker: &Marker, anchor: Vec3);

    fn end_frame(&mut self);

    /// Viewport changed.
    fn resize(&mut self, width: u32, height: u32);

    /// Release native resources. Called once during teardown.
    fn release(&mut self);
}

/// [`RenderTarget`] that draws nothing. The default when no host drawing
/// layer is attached.
#[derive(Debug, Default)]
pub struct NullRenderTarget;

impl RenderTarget for NullRenderTarget {
    fn begin_frame(&mut self) {}
    fn draw_marker(&mut self, _marker: &Marker) {}
    fn draw_label(&mut self, _marker: &Marker, _anchor: Vec3) {}
    fn end_frame(&mut self) {}
    fn resize(&mut self, _width: u32, _height: u32) {}
    fn release(&mut self) {}
}

/// Interactive orbit of the camera around the scene origin, with damping.
#[derive(Debug, Clone)]
struct OrbitControls {
    azimuth: f32,
    elevation: f32,
    radius: f32,
    azimuth_velocity: f32,
    elevation_velocity: f32,
    damping: f32,
}

impl OrbitControls {
    fn new(radius: f32) -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            radius,
            azimuth_velocity: 0.0,
            elevation_velocity: 0.0,
            damping: 0.05,
        }
    }

    fn input(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth_velocity += delta_azimuth;
        self.elevation_velocity += delta_elevation;
    }

    /// Advance one frame: integrate velocity, bleed it off by the damping
    /// factor, and pose the camera on the orbit sphere looking at origin.
    fn update(&mut self, camera: &mut Camera) {
        self.azimuth += self.azimuth_velocity;
        self.elevation += self.elevation_velocity;
        self.azimuth_velocity *= 1.0 - self.damping;
        self.elevation_velocity *= 1.0 - self.damping;

        // Keep the camera off the poles
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.elevation = self.elevation.clamp(-limit, limit);

        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        camera.position = Vec3::new(
            self.radius * cos_el * sin_az,
            self.radius * sin_el,
            self.radius * cos_el * cos_az,
        );
        camera.look_at(Vec3::ZERO);
    }
}

/// Owns the camera, viewport, and per-frame marker update pass.
pub struct SceneManager {
    camera: Mutex<Camera>,
    store: Arc<MarkerStore>,
    target: Mutex<Box<dyn RenderTarget>>,
    orbit: Mutex<Option<OrbitControls>>,
    config: SceneConfig,
    cleaned: AtomicBool,
}

impl SceneManager {
    /// Create a manager over `store`, drawing into `target`.
    #[must_use]
    pub fn new(config: SceneConfig, store: Arc<MarkerStore>, target: Box<dyn RenderTarget>) -> Self {
        let camera = Camera::new(
            config.fov_degrees,
            config.viewport_width,
            config.viewport_height,
        );
        let orbit = config
            .orbit_enabled
            .then(|| OrbitControls::new(config.reference_distance));
        Self {
            camera: Mutex::new(camera),
            store,
            target: Mutex::new(target),
            orbit: Mutex::new(orbit),
            config,
            cleaned: AtomicBool::new(false),
        }
    }

    /// Snapshot of the camera pose.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera.lock().unwrap().clone()
    }

    /// Feed an orbit input delta (radians). Ignored when orbit controls are
    /// disabled.
    pub fn orbit_input(&self, delta_azimuth: f32, delta_elevation: f32) {
        if let Some(orbit) = self.orbit.lock().unwrap().as_mut() {
            orbit.input(delta_azimuth, delta_elevation);
        }
    }

    /// The per-frame marker pass, run once before each render:
    ///
    /// 1. advance orbit controls (when enabled)
    /// 2. billboard every marker and label to the camera orientation
    /// 3. rescale each marker by `clamp(distance / reference, min, max)`
    pub fn update_pass(&self) {
        let camera = {
            let mut camera = self.camera.lock().unwrap();
            if let Some(orbit) = self.orbit.lock().unwrap().as_mut() {
                orbit.update(&mut camera);
            }
            camera.clone()
        };

        let reference = self.config.reference_distance;
        let (min_scale, max_scale) = (self.config.min_scale, self.config.max_scale);
        self.store.update_all(|marker| {
            marker.orientation = camera.orientation;
            let distance = camera.distance_to(marker.position);
            marker.scale = (distance / reference).clamp(min_scale, max_scale);
        });
    }

    /// Distance-derived scale for one marker distance.
    ///
    /// # Examples
    ///
    /// ```
    /// use wifi_scope::config::SceneConfig;
    /// use wifi_scope::scene::manager::SceneManager;
    ///
    /// let config = SceneConfig::default();
    /// assert_eq!(SceneManager::scale_for(&config, 5.0), 1.0);
    /// assert_eq!(SceneManager::scale_for(&config, 20.0), 2.0);
    /// assert_eq!(SceneManager::scale_for(&config, 1.0), 0.5);
    /// ```
    #[must_use]
    pub fn scale_for(config: &SceneConfig, distance: f32) -> f32 {
        (distance / config.reference_distance).clamp(config.min_scale, config.max_scale)
    }

    /// Render one frame: update pass, then scene and label layer.
    pub fn render(&self) {
        if self.cleaned.load(Ordering::SeqCst) {
            return;
        }
        self.update_pass();

        let markers = self.store.snapshot();
        let label_offset = Vec3::new(0.0, MARKER_RADIUS + self.config.label_offset, 0.0);
        let mut target = self.target.lock().unwrap();
        target.begin_frame();
        for marker in &markers {
            target.draw_marker(marker);
        }
        // Label layer renders after the scene, anchored above each marker
        for marker in &markers {
            target.draw_label(marker, marker.position + label_offset);
        }
        target.end_frame();
    }

    /// Viewport changed: recompute projection parameters and forward to the
    /// render seam.
    pub fn resize(&self, width: u32, height: u32) {
        self.camera.lock().unwrap().set_viewport(width, height);
        self.target.lock().unwrap().resize(width, height);
        debug!(width, height, "viewport resized");
    }

    /// Tear down: clear markers and release render resources.
    ///
    /// Idempotent and safe after partial initialization; later `render`
    /// calls are no-ops.
    pub fn cleanup(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }
        self.store.clear();
        self.target.lock().unwrap().release();
        *self.orbit.lock().unwrap() = None;
        info!("scene manager cleaned up");
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("markers", &self.store.len())
            .field("cleaned", &self.cleaned.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
