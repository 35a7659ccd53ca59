//! Screen-to-world resolution.
//!
//! Two strategies, ordered as an explicit fallback chain:
//!
//! 1. **Raycast** - cast a ray from the camera through the screen point and
//!    take the nearest intersection with existing scene geometry.
//! 2. **Fixed depth** - unproject the point and walk the camera ray to a
//!    fixed reference depth. Always produces a position.
//!
//! With the fixed-depth strategy last, [`SpatialProjector::resolve`] cannot
//! fail; the error path exists for chains built from future strategies.

use glam::{Vec2, Vec3};

use crate::error::{Result, WifiScopeError};
use crate::scene::camera::{Camera, Ray};

/// Sphere collider for raycast targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Nearest intersection parameter of `ray` with this sphere, if any.
    ///
    /// Intersections behind the ray origin are ignored; a ray starting
    /// inside the sphere hits the far surface.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -half_b - sqrt_d;
        if near > 0.0 {
            return Some(near);
        }
        let far = -half_b + sqrt_d;
        (far > 0.0).then_some(far)
    }
}

/// One screen-to-world strategy in the fallback chain.
///
/// `Ok(None)` means "no opinion, try the next strategy"; `Err` aborts the
/// chain.
pub trait ProjectionStrategy: Send + Sync {
    fn project(&self, camera: &Camera, screen: Vec2, colliders: &[Sphere]) -> Result<Option<Vec3>>;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str;
}

/// Nearest scene-geometry intersection along the screen ray.
#[derive(Debug, Default)]
pub struct RaycastStrategy;

impl ProjectionStrategy for RaycastStrategy {
    fn project(&self, camera: &Camera, screen: Vec2, colliders: &[Sphere]) -> Result<Option<Vec3>> {
        let ray = camera.ray_through(screen);
        let nearest = colliders
            .iter()
            .filter_map(|sphere| sphere.intersect(&ray))
            .min_by(|a, b| a.total_cmp(b));
        Ok(nearest.map(|t| ray.at(t)))
    }

    fn name(&self) -> &'static str {
        "raycast"
    }
}

/// Fixed-depth unprojection along the screen ray. Never declines.
#[derive(Debug)]
pub struct FixedDepthStrategy {
    pub depth: f32,
}

impl ProjectionStrategy for FixedDepthStrategy {
    fn project(&self, camera: &Camera, screen: Vec2, _colliders: &[Sphere]) -> Result<Option<Vec3>> {
        let ray = camera.ray_through(screen);
        Ok(Some(ray.at(self.depth)))
    }

    fn name(&self) -> &'static str {
        "fixed-depth"
    }
}

/// Resolves a 2D screen point into a 3D world position.
pub struct SpatialProjector {
    chain: Vec<Box<dyn ProjectionStrategy>>,
}

impl SpatialProjector {
    /// The standard chain: raycast, then fixed-depth at `reference_depth`.
    #[must_use]
    pub fn new(reference_depth: f32) -> Self {
        Self {
            chain: vec![
                Box::new(RaycastStrategy),
                Box::new(FixedDepthStrategy {
                    depth: reference_depth,
                }),
            ],
        }
    }

    /// A custom strategy chain, tried in order.
    #[must_use]
    pub fn with_chain(chain: Vec<Box<dyn ProjectionStrategy>>) -> Self {
        Self { chain }
    }

    /// Resolve a screen point to a world position.
    ///
    /// # Errors
    ///
    /// Returns `Projection` only when every strategy in the chain declines;
    /// the standard chain ends in fixed-depth projection and cannot fail.
    pub fn resolve(&self, camera: &Camera, screen: Vec2, colliders: &[Sphere]) -> Result<Vec3> {
        for strategy in &self.chain {
            if let Some(position) = strategy.project(camera, screen, colliders)? {
                return Ok(position);
            }
        }
        Err(WifiScopeError::Projection(format!(
            "no strategy resolved screen point ({}, {})",
            screen.x, screen.y
        )))
    }
}

impl std::fmt::Debug for SpatialProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.chain.iter().map(|s| s.name()).collect();
        f.debug_struct("SpatialProjector")
            .field("chain", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(75.0, 1920, 1080)
    }

    fn assert_vec3_close(a: Vec3, b: Vec3) {
        assert!(
            a.distance(b) < 1e-3,
            "expected {:?} to be close to {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_sphere_intersection_head_on() {
        let sphere = Sphere {
            center: Vec3::new(0.0, 0.0, 0.0),
            radius: 1.0,
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        let t = sphere.intersect(&ray).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere {
            center: Vec3::new(10.0, 0.0, 0.0),
            radius: 1.0,
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_sphere_behind_ray_ignored() {
        let sphere = Sphere {
            center: Vec3::new(0.0, 0.0, 10.0),
            radius: 1.0,
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_empty_scene_falls_back_to_fixed_depth() {
        let projector = SpatialProjector::new(5.0);
        let cam = camera();
        let position = projector.resolve(&cam, Vec2::ZERO, &[]).unwrap();
        // Camera at (0,0,5) looking -Z: five units along the view ray is
        // the world origin.
        assert_vec3_close(position, Vec3::ZERO);
    }

    #[test]
    fn test_raycast_hit_preferred_over_fixed_depth() {
        let projector = SpatialProjector::new(5.0);
        let cam = camera();
        let colliders = [Sphere {
            center: Vec3::new(0.0, 0.0, 2.0),
            radius: 0.5,
        }];
        let position = projector.resolve(&cam, Vec2::ZERO, &colliders).unwrap();
        // Nearest surface of the sphere, not the fixed-depth point
        assert_vec3_close(position, Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn test_nearest_of_multiple_hits_wins() {
        let projector = SpatialProjector::new(5.0);
        let cam = camera();
        let colliders = [
            Sphere {
                center: Vec3::new(0.0, 0.0, -2.0),
                radius: 0.5,
            },
            Sphere {
                center: Vec3::new(0.0, 0.0, 3.0),
                radius: 0.5,
            },
        ];
        let position = projector.resolve(&cam, Vec2::ZERO, &colliders).unwrap();
        assert_vec3_close(position, Vec3::new(0.0, 0.0, 3.5));
    }

    #[test]
    fn test_fixed_depth_tracks_offcenter_ray() {
        let projector = SpatialProjector::new(5.0);
        let cam = camera();
        let position = projector
            .resolve(&cam, Vec2::new(0.5, 0.0), &[])
            .unwrap();
        assert!((cam.distance_to(position) - 5.0).abs() < 1e-3);
        assert!(position.x > 0.0);
    }

    #[test]
    fn test_raycast_only_chain_declines_empty_scene() {
        let projector = SpatialProjector::with_chain(vec![Box::new(RaycastStrategy)]);
        let cam = camera();
        let result = projector.resolve(&cam, Vec2::ZERO, &[]);
        assert!(matches!(
            result,
            Err(crate::error::WifiScopeError::Projection(_))
        ));
    }
}
