//! Latest-value pointer cell
//!
//! The pointer listener owns the single [`PointerWriter`], the frame loop the
//! single [`PointerReader`]. Intermediate positions between two reads are
//! overwritten; only the most recent one is seen by the next frame.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

/// One pointer reading in normalized device coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    /// NDC position, y up
    pub position: Vec2,
    /// True while motion happened within the idle timeout
    pub moving: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct PointerState {
    position: Vec2,
    last_move_ms: Option<f64>,
}

/// Create a connected writer/reader pair.
pub fn pointer_channel(idle_timeout_ms: f64) -> (PointerWriter, PointerReader) {
    let cell = Rc::new(Cell::new(PointerState::default()));
    (
        PointerWriter { cell: cell.clone() },
        PointerReader { cell, idle_timeout_ms },
    )
}

/// Write side, fed by pointer events
#[derive(Debug)]
pub struct PointerWriter {
    cell: Rc<Cell<PointerState>>,
}

impl PointerWriter {
    /// Record a motion event in client (CSS pixel) coordinates.
    pub fn record_move(&self, client_x: f64, client_y: f64, viewport_width: f64, viewport_height: f64, now_ms: f64) {
        let width = viewport_width.max(1.0);
        let height = viewport_height.max(1.0);
        let x = (client_x / width) * 2.0 - 1.0;
        let y = -(client_y / height) * 2.0 + 1.0;
        self.record_ndc(Vec2::new(x as f32, y as f32), now_ms);
    }

    /// Record a motion event already expressed in NDC.
    pub fn record_ndc(&self, position: Vec2, now_ms: f64) {
        self.cell.set(PointerState {
            position,
            last_move_ms: Some(now_ms),
        });
    }
}

/// Read side, sampled once per frame
#[derive(Debug)]
pub struct PointerReader {
    cell: Rc<Cell<PointerState>>,
    idle_timeout_ms: f64,
}

impl PointerReader {
    pub fn sample(&self, now_ms: f64) -> PointerSample {
        let state = self.cell.get();
        let moving = state
            .last_move_ms
            .is_some_and(|t| now_ms - t < self.idle_timeout_ms);
        PointerSample {
            position: state.position,
            moving,
        }
    }
}
