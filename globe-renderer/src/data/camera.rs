use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::{common::geo::GLOBE_RADIUS, data::Size};

pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;

/// Closest the camera may get to the globe center.
pub const MIN_DISTANCE: f32 = GLOBE_RADIUS + 1.0;
pub const MAX_DISTANCE: f32 = 30.0;

/// Keeps the orbit from flipping over the poles.
const MAX_PITCH: f32 = 1.55;

/// A ray in world space with a normalized direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// The globe camera. The view target is pinned to the globe center at all
/// times; only the eye moves, either orbited by the controller or
/// interpolated by the focus animator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub eye: Vec3,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            eye: Self::DEFAULT_POSITION,
            fov_y: 45.0_f32.to_radians(),
            near: NEAR,
            far: FAR,
        }
    }
}

impl OrbitCamera {
    pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 10.0, 15.0);

    fn up(&self) -> Vec3 {
        // Fall back to Z up when the eye sits on the pole axis, where the
        // world up would be colinear with the view direction.
        if self.eye.normalize().y.abs() > 0.999 {
            Vec3::Z
        } else {
            Vec3::Y
        }
    }

    pub fn distance(&self) -> f32 {
        self.eye.length()
    }

    pub fn set_distance(&mut self, distance: f32) {
        let clamped = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.eye = self.eye.normalize() * clamped;
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_distance(self.distance() * factor);
    }

    /// Rotates the eye around the globe center. Pitch is clamped short of
    /// the poles.
    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let r = self.distance();
        let pitch = (self.eye.y / r).asin();
        let yaw = self.eye.z.atan2(self.eye.x);

        let pitch = (pitch + pitch_delta).clamp(-MAX_PITCH, MAX_PITCH);
        let yaw = yaw + yaw_delta;

        self.eye = Vec3::new(
            r * pitch.cos() * yaw.cos(),
            r * pitch.sin(),
            r * pitch.cos() * yaw.sin(),
        );
    }

    pub fn get_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, Vec3::ZERO, self.up())
    }

    pub fn build_view_proj_matrix(&self, width: f32, height: f32) -> Mat4 {
        let aspect_ratio = width / height;
        let proj = Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near, self.far);

        proj * self.get_view()
    }

    pub fn build_view_normal_matrix(&self) -> Mat4 {
        self.get_view().inverse().transpose()
    }

    pub fn position(&self) -> Vec4 {
        Vec4::from((self.eye, 0.0))
    }

    /// World-space ray through a point given in normalized device
    /// coordinates ([-1, 1] on both axes, y up).
    pub fn ray_through(&self, ndc: Vec2, bounds: Size<f32>) -> Ray {
        let inverse = self
            .build_view_proj_matrix(bounds.width, bounds.height)
            .inverse();
        let far_point = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let far_point = far_point.truncate() / far_point.w;

        Ray {
            origin: self.eye,
            direction: (far_point - self.eye).normalize(),
        }
    }

    /// Projects a world point to normalized device coordinates. Returns
    /// `None` for points behind the eye.
    pub fn project(&self, point: Vec3, bounds: Size<f32>) -> Option<Vec2> {
        let clip =
            self.build_view_proj_matrix(bounds.width, bounds.height) * Vec4::from((point, 1.0));
        if clip.w <= 0.0 {
            return None;
        }
        Some(Vec2::new(clip.x / clip.w, clip.y / clip.w))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_distance_is_within_orbit_bounds() {
        let camera = OrbitCamera::default();
        assert!(camera.distance() > MIN_DISTANCE);
        assert!(camera.distance() < MAX_DISTANCE);
    }

    #[test]
    fn zoom_respects_the_distance_clamp() {
        let mut camera = OrbitCamera::default();
        for _ in 0..50 {
            camera.zoom_by(0.8);
        }
        assert_relative_eq!(camera.distance(), MIN_DISTANCE, epsilon = 1e-3);
        for _ in 0..50 {
            camera.zoom_by(1.2);
        }
        assert_relative_eq!(camera.distance(), MAX_DISTANCE, epsilon = 1e-3);
    }

    #[test]
    fn orbit_preserves_distance() {
        let mut camera = OrbitCamera::default();
        let before = camera.distance();
        camera.orbit(0.3, -0.2);
        assert_relative_eq!(camera.distance(), before, epsilon = 1e-4);
    }

    #[test]
    fn projection_round_trips_through_ray_casting() {
        let camera = OrbitCamera::default();
        let bounds = Size::from((800.0, 600.0));
        let point = Vec3::new(0.0, 5.0, 0.5);

        let ndc = camera.project(point, bounds).unwrap();
        let ray = camera.ray_through(ndc, bounds);

        // The ray through the projected coordinates passes through the
        // original point.
        let to_point = (point - ray.origin).normalize();
        assert!(ray.direction.dot(to_point) > 0.9999);
    }
}
