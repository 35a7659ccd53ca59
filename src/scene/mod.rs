//! # Scene Module
//!
//! The spatial annotation engine.
//!
//! This module handles:
//! - The perspective camera and screen-to-world ray construction
//! - The raycast / fixed-depth projection fallback chain
//! - Marker construction, classification colors, and ownership
//! - The per-frame billboard/rescale pass and rendering seam

pub mod camera;
pub mod manager;
pub mod marker;
pub mod projector;

pub use camera::{Camera, Ray};
pub use manager::{NullRenderTarget, RenderTarget, SceneManager};
pub use marker::{Marker, MarkerFactory, MarkerId, MarkerStore};
pub use projector::{SpatialProjector, Sphere};
