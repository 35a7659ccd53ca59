//! Perspective camera and ray construction.
//!
//! Right-handed, Y-up, looking down -Z at identity orientation. Screen
//! points are normalized device coordinates: x and y in [-1, 1], (0, 0) at
//! the viewport center.

use glam::{Mat4, Quat, Vec2, Vec3};

/// A ray in world space. Direction is always unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    fov_y_radians: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a camera at the conventional start pose: origin pushed back to
    /// z = 5, identity orientation.
    ///
    /// # Arguments
    ///
    /// * `fov_degrees` - Vertical field of view
    /// * `width`, `height` - Viewport dimensions for the aspect ratio
    #[must_use]
    pub fn new(fov_degrees: f32, width: u32, height: u32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            orientation: Quat::IDENTITY,
            fov_y_radians: fov_degrees.to_radians(),
            aspect: width as f32 / height as f32,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Recompute the aspect ratio for a new viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    /// Unit vector the camera looks along.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// World-to-clip transform.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        let projection =
            Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect, self.near, self.far);
        let view =
            Mat4::from_rotation_translation(self.orientation, self.position).inverse();
        projection * view
    }

    /// Ray from the camera through a screen point.
    ///
    /// Unprojects the point onto the near plane and aims from the camera
    /// position through it.
    #[must_use]
    pub fn ray_through(&self, screen: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near_point = inverse.project_point3(Vec3::new(screen.x, screen.y, -1.0));
        let direction = (near_point - self.position).normalize_or_zero();
        // Degenerate only if the near point coincides with the camera,
        // which the near plane distance prevents.
        let direction = if direction == Vec3::ZERO {
            self.forward()
        } else {
            direction
        };
        Ray {
            origin: self.position,
            direction,
        }
    }

    /// Distance from the camera to a world point.
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Point the camera at a target, keeping Y up.
    pub fn look_at(&mut self, target: Vec3) {
        if (target - self.position).length_squared() < f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.orientation = rotation;
    }
}
