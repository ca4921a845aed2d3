//! Stitch points and lines along the pointer path
//!
//! Pure data: positions and timestamps in bounded ring buffers. GPU-side
//! state for the same entities lives in [`super::markers`] and the backend.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::trace;

use super::backend::LineVertex;
use super::config::TrailConfig;
use crate::theme::colors;

/// A recorded location on the trail
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StitchPoint {
    pub position: Vec3,
    /// Creation time (ms)
    pub timestamp: f64,
}

/// Segment between two consecutive stitch points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StitchLine {
    pub start: Vec3,
    pub end: Vec3,
    /// Creation time (ms)
    pub timestamp: f64,
}

/// Result of recording a point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recorded {
    /// A line to the previous point was added
    pub line: bool,
    /// The oldest point was evicted to stay within capacity
    pub evicted_point: bool,
    /// The oldest line was evicted to stay within capacity
    pub evicted_line: bool,
}

/// Bounded point/line buffers plus the last recorded position
#[derive(Debug)]
pub struct Trail {
    points: VecDeque<StitchPoint>,
    lines: VecDeque<StitchLine>,
    last_position: Option<Vec3>,
    max_points: usize,
    max_lines: usize,
    threshold: f32,
}

impl Trail {
    pub fn new(config: &TrailConfig) -> Self {
        Self {
            points: VecDeque::with_capacity(config.max_points + 1),
            lines: VecDeque::with_capacity(config.max_lines + 1),
            last_position: None,
            max_points: config.max_points,
            max_lines: config.max_lines,
            threshold: config.stitch_threshold,
        }
    }

    /// Whether a point at `position` would be far enough from the last one.
    pub fn accepts(&self, position: Vec3) -> bool {
        match self.last_position {
            None => true,
            Some(last) => last.distance(position) > self.threshold,
        }
    }

    /// Record a point (and a line from the previous point) if it passes the
    /// distance threshold. Returns `None` when the sample was too close.
    pub fn record(&mut self, position: Vec3, timestamp: f64) -> Option<Recorded> {
        if !self.accepts(position) {
            return None;
        }

        let mut recorded = Recorded::default();

        self.points.push_back(StitchPoint { position, timestamp });
        if self.points.len() > self.max_points {
            self.points.pop_front();
            recorded.evicted_point = true;
        }

        if let Some(start) = self.last_position {
            self.lines.push_back(StitchLine {
                start,
                end: position,
                timestamp,
            });
            recorded.line = true;
            if self.lines.len() > self.max_lines {
                self.lines.pop_front();
                recorded.evicted_line = true;
            }
        }

        self.last_position = Some(position);

        trace!(
            x = position.x,
            y = position.y,
            points = self.points.len(),
            lines = self.lines.len(),
            line = recorded.line,
            evicted_point = recorded.evicted_point,
            evicted_line = recorded.evicted_line,
            "Stitch recorded"
        );
        Some(recorded)
    }

    /// Fill `out` with two white vertices per line younger than `fade_ms`.
    pub fn write_line_vertices(&self, now_ms: f64, fade_ms: f64, out: &mut Vec<LineVertex>) {
        out.clear();
        for line in self.lines.iter().filter(|l| now_ms - l.timestamp < fade_ms) {
            out.push(LineVertex::new(line.start, colors::LINE_RGB));
            out.push(LineVertex::new(line.end, colors::LINE_RGB));
        }
    }

    /// Drop points and lines whose age reached `fade_ms`.
    pub fn prune(&mut self, now_ms: f64, fade_ms: f64) {
        self.lines.retain(|l| now_ms - l.timestamp < fade_ms);
        self.points.retain(|p| now_ms - p.timestamp < fade_ms);
    }

    pub fn points(&self) -> &VecDeque<StitchPoint> {
        &self.points
    }

    pub fn lines(&self) -> &VecDeque<StitchLine> {
        &self.lines
    }

    pub fn last_position(&self) -> Option<Vec3> {
        self.last_position
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.last_position = None;
    }
}
