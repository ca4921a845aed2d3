//! Headless backend: records what a GPU backend would do
//!
//! Drives the CLI simulation and the unit tests. Tracks live marker handles
//! so a leak or double release shows up in the counters.

use std::collections::HashSet;

use glam::Vec3;
use tracing::{debug, warn};

use super::backend::{RenderBackend, SceneFrame};
use super::error::{TrailError, TrailResult};

/// Marker handle; deliberately neither `Clone` nor `Copy`
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct HeadlessMarker(u64);

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: HashSet<u64>,
    created: u64,
    released: u64,
    draw_calls: u64,
    last_line_vertices: usize,
    last_markers: usize,
    width: u32,
    height: u32,
    scroll_offset: f64,
    disposed: bool,
    /// Error returned by the next `draw` call
    fail_next_draw: Option<TrailError>,
    /// Error returned by every `create_marker` call while set
    fail_create: Option<TrailError>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_draw(&mut self, error: TrailError) {
        self.fail_next_draw = Some(error);
    }

    pub fn fail_marker_creation(&mut self, error: Option<TrailError>) {
        self.fail_create = error;
    }

    pub fn markers_created(&self) -> u64 {
        self.created
    }

    pub fn markers_released(&self) -> u64 {
        self.released
    }

    pub fn live_markers(&self) -> usize {
        self.live.len()
    }

    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    pub fn last_line_vertices(&self) -> usize {
        self.last_line_vertices
    }

    pub fn last_markers(&self) -> usize {
        self.last_markers
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl RenderBackend for HeadlessBackend {
    type Marker = HeadlessMarker;

    fn create_marker(&mut self, _position: Vec3, _rotation: f32, _half_size: f32) -> TrailResult<HeadlessMarker> {
        if let Some(err) = &self.fail_create {
            return Err(err.clone());
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.created += 1;
        Ok(HeadlessMarker(id))
    }

    fn release_marker(&mut self, marker: HeadlessMarker) {
        if self.live.remove(&marker.0) {
            self.released += 1;
        } else {
            warn!(id = marker.0, "Released unknown marker");
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> TrailResult<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    fn draw(&mut self, frame: &SceneFrame<'_, HeadlessMarker>) -> TrailResult<()> {
        if let Some(err) = self.fail_next_draw.take() {
            return Err(err);
        }
        self.draw_calls += 1;
        self.last_line_vertices = frame.line_vertices.len();
        self.last_markers = frame.markers.len();
        Ok(())
    }

    fn dispose(&mut self) {
        debug!(
            created = self.created,
            released = self.released,
            live = self.live.len(),
            "Headless backend disposed"
        );
        self.disposed = true;
    }
}
