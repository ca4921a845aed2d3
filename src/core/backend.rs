//! Rendering backend seam
//!
//! The trail core owns all entity state; a backend only owns GPU-side
//! resources. Marker handles are moved back into the backend on release, so
//! a handle can be released once and never reused.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::error::TrailResult;
use super::markers::MarkerSet;

/// One endpoint in the shared line draw buffer (24 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub fn new(position: Vec3, color: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }
}

/// Everything a backend needs to draw one frame
pub struct SceneFrame<'a, M> {
    pub view_projection: Mat4,
    pub markers: &'a MarkerSet<M>,
    pub line_vertices: &'a [LineVertex],
    pub line_opacity: f32,
}

pub trait RenderBackend {
    /// Owned per-marker resource
    type Marker;

    /// Allocate the resources for one cross marker.
    fn create_marker(&mut self, position: Vec3, rotation: f32, half_size: f32) -> TrailResult<Self::Marker>;

    fn release_marker(&mut self, marker: Self::Marker);

    /// Resize the drawing surface (CSS pixels).
    fn resize(&mut self, width: u32, height: u32) -> TrailResult<()>;

    /// Vertical page scroll the surface must follow.
    fn set_scroll_offset(&mut self, offset: f64);

    fn draw(&mut self, frame: &SceneFrame<'_, Self::Marker>) -> TrailResult<()>;

    /// Release the remaining shared resources. Called once, after every
    /// marker has been handed back.
    fn dispose(&mut self);
}
