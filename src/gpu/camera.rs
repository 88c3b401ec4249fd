//! Orbit camera around the shell center.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

const FOV_Y_DEG: f32 = 45.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

/// Orbit camera for viewing the cluster.
///
/// The base distance comes from the scene (the intro zoom animates it);
/// the mouse wheel scales it through `zoom`.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point, before zoom.
    pub distance: f32,
    /// Wheel zoom factor applied to `distance`.
    pub zoom: f32,
    pub target: Vec3,
}

impl OrbitCamera {
    pub fn new(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance,
            zoom: 1.0,
            target: Vec3::ZERO,
        }
    }

    /// Rotate by a mouse drag in pixels.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * 0.005;
        self.pitch = (self.pitch + delta.y * 0.005).clamp(-1.5, 1.5);
    }

    /// Zoom by wheel lines; positive zooms in.
    pub fn scroll(&mut self, lines: f32) {
        self.zoom = (self.zoom * (1.0 - lines * 0.08)).clamp(0.4, 2.5);
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let d = self.distance * self.zoom;
        let x = d * self.pitch.cos() * self.yaw.sin();
        let y = d * self.pitch.sin();
        let z = d * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, NEAR, FAR)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// World-space right and up axes of the view, for billboards.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }

    /// Ray through a point in normalized device coordinates.
    ///
    /// Returns `(origin, direction)` with a unit direction.
    pub fn screen_ray(&self, ndc: Vec2, aspect: f32) -> (Vec3, Vec3) {
        let inverse = self.view_proj(aspect).inverse();
        // wgpu depth range is 0..1.
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        (near, (far - near).normalize_or_zero())
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(14.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = OrbitCamera::new(10.0);
        let (origin, dir) = camera.screen_ray(Vec2::ZERO, 16.0 / 9.0);
        let to_target = (camera.target - camera.position()).normalize();
        assert!((dir - to_target).length() < 1e-3);
        // Ray starts on the near plane, just in front of the camera.
        assert!((origin - camera.position()).length() < 0.2);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let mut camera = OrbitCamera::default();
        camera.orbit(Vec2::new(120.0, -40.0));
        let (right, up) = camera.basis();
        assert!((right.length() - 1.0).abs() < 1e-4);
        assert!((up.length() - 1.0).abs() < 1e-4);
        assert!(right.dot(up).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_and_pitch_are_clamped() {
        let mut camera = OrbitCamera::default();
        camera.scroll(1000.0);
        assert_eq!(camera.zoom, 0.4);
        camera.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(camera.pitch, 1.5);
    }
}
