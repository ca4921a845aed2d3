//! Perspective camera and screen → scene unprojection
//!
//! GL clip conventions (NDC depth in [-1, 1]); the camera sits on +z looking
//! down -z at the origin.

use glam::{Mat4, Vec2, Vec3};

use super::config::TrailConfig;

/// Perspective camera with a fixed vertical field of view
#[derive(Clone, Debug)]
pub struct Camera {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vec3,
    projection: Mat4,
    /// Camera world transform composed with the inverse projection
    unproject: Mat4,
}

impl Camera {
    pub fn new(config: &TrailConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            fov_y: config.fov_degrees.to_radians(),
            aspect: 1.0,
            near: config.near,
            far: config.far,
            position: Vec3::new(0.0, 0.0, config.camera_distance),
            projection: Mat4::IDENTITY,
            unproject: Mat4::IDENTITY,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Update the aspect ratio from a viewport size. Zero sizes clamp to 1.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.projection = Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far);
        self.unproject = self.world() * self.projection.inverse();
    }

    /// Map normalized device coordinates ([-1, 1] per axis) to the scene
    /// point at NDC depth 0.
    pub fn screen_to_scene(&self, ndc: Vec2) -> Vec3 {
        self.unproject.project_point3(ndc.extend(0.0))
    }

    /// Projection × view, as uploaded to the shader
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.world().inverse()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    fn world(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_center_lies_on_view_axis() {
        let camera = Camera::new(&TrailConfig::default(), 1920, 1080);
        let p = camera.screen_to_scene(Vec2::ZERO);
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 0.0));
        // Between the near plane and the camera's focus
        assert!(p.z < TrailConfig::default().camera_distance);
        assert!(p.z > 0.0);
    }

    #[test]
    fn test_unprojection_round_trips_through_projection() {
        let camera = Camera::new(&TrailConfig::default(), 800, 600);
        let ndc = Vec2::new(0.5, -0.25);
        let scene = camera.screen_to_scene(ndc);
        let back = camera.view_projection().project_point3(scene);
        assert!(approx(back.x, ndc.x));
        assert!(approx(back.y, ndc.y));
        assert!(approx(back.z, 0.0));
    }

    #[test]
    fn test_aspect_widens_horizontal_extent() {
        let mut camera = Camera::new(&TrailConfig::default(), 1000, 1000);
        let square = camera.screen_to_scene(Vec2::new(1.0, 1.0));
        assert!(approx(square.x, square.y));

        camera.set_viewport(2000, 1000);
        assert!(approx(camera.aspect(), 2.0));
        let wide = camera.screen_to_scene(Vec2::new(1.0, 1.0));
        assert!(approx(wide.x, 2.0 * wide.y));
    }

    #[test]
    fn test_zero_viewport_is_clamped() {
        let camera = Camera::new(&TrailConfig::default(), 0, 0);
        assert_eq!(camera.aspect(), 1.0);
        assert!(camera.screen_to_scene(Vec2::ONE).is_finite());
    }
}
