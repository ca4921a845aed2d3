//! Trail renderer: ingestion, decay and the per-frame tick
//!
//! Owns the camera, the point/line buffers, the marker set and the backend.
//! The host drives it by calling [`TrailRenderer::frame`] once per display
//! refresh; everything inside a frame runs to completion.

use glam::{Vec2, Vec3};
use tracing::{debug, error, info, warn};

use super::backend::{LineVertex, RenderBackend, SceneFrame};
use super::camera::Camera;
use super::config::TrailConfig;
use super::error::TrailResult;
use super::markers::{MarkerSet, StitchMarker};
use super::pointer::PointerSample;
use super::rng::Jitter;
use super::state::LoopState;
use super::stats::{FpsCounter, FrameStats};
use super::trail::{StitchLine, StitchPoint, Trail};

/// Interval between periodic stats log lines (ms)
const STATS_INTERVAL_MS: f64 = 5_000.0;

/// Per-frame input gathered by the host
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub now_ms: f64,
    pub pointer: PointerSample,
    /// Current vertical page scroll (CSS pixels)
    pub scroll_offset: f64,
}

/// What happened during one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Drawn,
    /// A recoverable error was logged and the frame dropped
    Skipped,
    /// Not running; the host should stop scheduling frames
    Stopped,
}

pub struct TrailRenderer<B: RenderBackend> {
    config: TrailConfig,
    camera: Camera,
    trail: Trail,
    markers: MarkerSet<B::Marker>,
    /// Shared line draw buffer, rebuilt every decay pass
    line_vertices: Vec<LineVertex>,
    jitter: Jitter,
    backend: B,
    state: LoopState,
    fps: FpsCounter,
    frames: u64,
    skipped_frames: u64,
    last_stats_ms: f64,
}

impl<B: RenderBackend> TrailRenderer<B> {
    /// Set up the camera and size the backend surface. On failure the
    /// backend is disposed before the error is returned.
    pub fn initialize(config: TrailConfig, mut backend: B, width: u32, height: u32) -> TrailResult<Self> {
        if let Err(e) = config.validate().and_then(|()| backend.resize(width, height)) {
            backend.dispose();
            return Err(e);
        }

        info!(
            width,
            height,
            max_points = config.max_points,
            max_lines = config.max_lines,
            fade_ms = config.fade_ms,
            "Trail renderer initialized"
        );

        Ok(Self {
            camera: Camera::new(&config, width, height),
            trail: Trail::new(&config),
            markers: MarkerSet::new(config.max_points + 1),
            line_vertices: Vec::with_capacity(config.max_lines * 2),
            jitter: Jitter::from_entropy(),
            backend,
            state: LoopState::Idle,
            fps: FpsCounter::new(),
            frames: 0,
            skipped_frames: 0,
            last_stats_ms: 0.0,
            config,
        })
    }

    /// Replace the rotation jitter source (reproducible runs).
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Idle → Running. Returns false if the renderer was not idle.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        self.state = LoopState::Running;
        info!("Trail renderer started");
        true
    }

    pub fn screen_to_scene(&self, ndc: Vec2) -> Vec3 {
        self.camera.screen_to_scene(ndc)
    }

    /// Feed one pointer sample. Returns whether a stitch point was recorded.
    pub fn on_sample(&mut self, sample: PointerSample, timestamp: f64) -> TrailResult<bool> {
        if !sample.moving || self.state.is_disposed() {
            return Ok(false);
        }
        let position = self.camera.screen_to_scene(sample.position);
        self.ingest_scene(position, timestamp)
    }

    /// Record a stitch at a scene-space position, subject to the distance
    /// threshold and capacity limits.
    pub fn ingest_scene(&mut self, position: Vec3, timestamp: f64) -> TrailResult<bool> {
        if self.state.is_disposed() || !self.trail.accepts(position) {
            return Ok(false);
        }

        let rotation = self.jitter.centered(self.config.rotation_jitter);
        let resource = self
            .backend
            .create_marker(position, rotation, self.config.marker_half_size)?;

        let Some(recorded) = self.trail.record(position, timestamp) else {
            self.backend.release_marker(resource);
            return Ok(false);
        };

        self.markers.push(StitchMarker::new(
            position,
            timestamp,
            rotation,
            self.config.marker_opacity,
            resource,
        ));
        if recorded.evicted_point && self.markers.len() > self.config.max_points {
            self.markers.evict_oldest(&mut self.backend);
        }
        Ok(true)
    }

    /// Age out markers and lines, then rebuild the line draw buffer.
    pub fn decay(&mut self, now_ms: f64) {
        if self.state.is_disposed() {
            return;
        }
        let fade_ms = self.config.fade_ms;

        self.markers.update(now_ms, &self.config);
        self.markers.sweep(&mut self.backend);

        self.trail.write_line_vertices(now_ms, fade_ms, &mut self.line_vertices);
        self.trail.prune(now_ms, fade_ms);
    }

    /// One frame: follow scroll, ingest, decay, draw. No-op unless running.
    pub fn tick(&mut self, input: FrameInput) -> TrailResult<()> {
        if !self.state.is_running() {
            return Ok(());
        }

        self.backend.set_scroll_offset(input.scroll_offset);
        self.on_sample(input.pointer, input.now_ms)?;
        self.decay(input.now_ms);

        self.fps.tick(input.now_ms);
        self.frames += 1;

        self.backend.draw(&SceneFrame {
            view_projection: self.camera.view_projection(),
            markers: &self.markers,
            line_vertices: &self.line_vertices,
            line_opacity: self.config.line_opacity,
        })
    }

    /// Run [`Self::tick`] and contain its errors. Fatal errors dispose the
    /// renderer, others drop the frame.
    pub fn frame(&mut self, input: FrameInput) -> FrameStatus {
        if !self.state.is_running() {
            return FrameStatus::Stopped;
        }

        let status = match self.tick(input) {
            Ok(()) => FrameStatus::Drawn,
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Trail renderer stopped");
                self.dispose();
                return FrameStatus::Stopped;
            }
            Err(e) => {
                warn!(error = %e, "Frame skipped");
                self.skipped_frames += 1;
                FrameStatus::Skipped
            }
        };

        if input.now_ms - self.last_stats_ms >= STATS_INTERVAL_MS {
            self.last_stats_ms = input.now_ms;
            let stats = self.stats();
            debug!(
                fps = format!("{:.0}", stats.fps),
                points = stats.points,
                lines = stats.lines,
                markers = stats.markers,
                skipped = stats.skipped_frames,
                "stats"
            );
        }
        status
    }

    /// Apply a new viewport size without touching trail state.
    pub fn resize(&mut self, width: u32, height: u32) -> TrailResult<()> {
        if self.state.is_disposed() {
            return Ok(());
        }
        self.camera.set_viewport(width, height);
        self.backend.resize(width, height)?;
        debug!(width, height, aspect = self.camera.aspect(), "Viewport resized");
        Ok(())
    }

    /// Release every marker and the backend. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.state.is_disposed() {
            return;
        }
        let released = self.markers.release_all(&mut self.backend);
        self.trail.clear();
        self.line_vertices.clear();
        self.backend.dispose();
        self.state = LoopState::Disposed;
        info!(released, frames = self.frames, "Trail renderer disposed");
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn points(&self) -> impl Iterator<Item = &StitchPoint> {
        self.trail.points().iter()
    }

    pub fn lines(&self) -> impl Iterator<Item = &StitchLine> {
        self.trail.lines().iter()
    }

    pub fn markers(&self) -> &MarkerSet<B::Marker> {
        &self.markers
    }

    pub fn line_vertices(&self) -> &[LineVertex] {
        &self.line_vertices
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            fps: self.fps.fps(),
            points: self.trail.points().len(),
            lines: self.trail.lines().len(),
            markers: self.markers.len(),
            line_vertices: self.line_vertices.len(),
            frames: self.frames,
            skipped_frames: self.skipped_frames,
        }
    }
}

impl<B: RenderBackend> Drop for TrailRenderer<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::TrailError;
    use crate::core::headless::HeadlessBackend;

    fn renderer() -> TrailRenderer<HeadlessBackend> {
        TrailRenderer::initialize(TrailConfig::default(), HeadlessBackend::new(), 1280, 720)
            .unwrap()
            .with_jitter(Jitter::with_seed(1))
    }

    fn moving(x: f32, y: f32) -> PointerSample {
        PointerSample {
            position: Vec2::new(x, y),
            moving: true,
        }
    }

    fn input(now_ms: f64, pointer: PointerSample) -> FrameInput {
        FrameInput {
            now_ms,
            pointer,
            scroll_offset: 0.0,
        }
    }

    /// Scene-space points spaced well past the threshold
    fn spaced(i: usize) -> Vec3 {
        Vec3::new(i as f32 * 0.1, 0.0, 0.0)
    }

    #[test]
    fn test_three_samples_three_points_two_lines() {
        let mut r = renderer();
        for i in 0..3 {
            assert!(r.ingest_scene(spaced(i), i as f64 * 16.0).unwrap());
        }
        assert_eq!(r.points().count(), 3);
        assert_eq!(r.lines().count(), 2);
        assert_eq!(r.markers().len(), 3);
    }

    #[test]
    fn test_buffers_stabilize_at_capacity() {
        let mut r = renderer();
        for i in 0..150 {
            r.ingest_scene(spaced(i), i as f64 * 16.0).unwrap();
            assert!(r.points().count() <= 100);
            assert!(r.lines().count() <= 200);
            assert!(r.markers().len() <= 100);
        }

        assert_eq!(r.points().count(), 100);
        assert_eq!(r.markers().len(), 100);
        assert_eq!(r.lines().count(), 149);
        let first = r.points().next().unwrap();
        assert_eq!(first.position, spaced(50));
        assert_eq!(r.markers().iter().next().unwrap().position, spaced(50));

        // Evicted markers were handed back
        assert_eq!(r.backend().markers_created(), 150);
        assert_eq!(r.backend().markers_released(), 50);
    }

    #[test]
    fn test_line_capacity_with_small_config() {
        let config = TrailConfig {
            max_points: 500,
            max_lines: 200,
            ..TrailConfig::default()
        };
        let mut r = TrailRenderer::initialize(config, HeadlessBackend::new(), 100, 100).unwrap();
        for i in 0..400 {
            r.ingest_scene(spaced(i), i as f64).unwrap();
        }
        assert_eq!(r.lines().count(), 200);
        assert_eq!(r.points().count(), 400);
    }

    #[test]
    fn test_close_samples_are_ignored() {
        let mut r = renderer();
        assert!(r.ingest_scene(Vec3::ZERO, 0.0).unwrap());
        assert!(!r.ingest_scene(Vec3::new(0.01, 0.02, 0.0), 16.0).unwrap());
        assert_eq!(r.points().count(), 1);
        assert_eq!(r.backend().markers_created(), 1);
    }

    #[test]
    fn test_not_moving_records_nothing() {
        let mut r = renderer();
        let idle = PointerSample {
            position: Vec2::new(0.5, 0.5),
            moving: false,
        };
        assert!(!r.on_sample(idle, 0.0).unwrap());
        assert_eq!(r.points().count(), 0);
    }

    #[test]
    fn test_on_sample_projects_through_camera() {
        let mut r = renderer();
        assert!(r.on_sample(moving(0.0, 0.0), 0.0).unwrap());
        assert!(r.on_sample(moving(0.9, 0.0), 16.0).unwrap());

        let expected = r.screen_to_scene(Vec2::new(0.9, 0.0));
        let last = r.points().last().unwrap();
        assert_eq!(last.position, expected);
        assert_eq!(r.lines().count(), 1);
    }

    #[test]
    fn test_everything_fades_after_fade_duration() {
        let mut r = renderer();
        r.ingest_scene(Vec3::ZERO, 0.0).unwrap();
        r.ingest_scene(spaced(1), 0.0).unwrap();

        r.decay(5_000.0);
        assert_eq!(r.markers().len(), 2);
        assert_eq!(r.line_vertices().len(), 2);
        let opacity = r.markers().iter().next().unwrap().opacity;
        assert!((opacity - 0.45).abs() < 1e-6);

        r.decay(10_001.0);
        assert_eq!(r.markers().len(), 0);
        assert_eq!(r.lines().count(), 0);
        assert_eq!(r.points().count(), 0);
        assert!(r.line_vertices().is_empty());
        assert_eq!(r.backend().live_markers(), 0);
    }

    #[test]
    fn test_single_sample_gone_after_one_tick() {
        let mut r = renderer();
        r.start();
        assert_eq!(r.frame(input(0.0, moving(0.0, 0.0))), FrameStatus::Drawn);
        assert_eq!(r.markers().len(), 1);

        let still = PointerSample::default();
        assert_eq!(r.frame(input(10_001.0, still)), FrameStatus::Drawn);
        assert_eq!(r.markers().len(), 0);
        assert_eq!(r.lines().count(), 0);
        assert_eq!(r.backend().last_line_vertices(), 0);
        assert_eq!(r.backend().last_markers(), 0);
    }

    #[test]
    fn test_tick_follows_scroll_and_draws() {
        let mut r = renderer();
        r.start();
        let frame = FrameInput {
            now_ms: 0.0,
            pointer: PointerSample::default(),
            scroll_offset: 420.0,
        };
        assert_eq!(r.frame(frame), FrameStatus::Drawn);
        assert_eq!(r.backend().scroll_offset(), 420.0);
        assert_eq!(r.backend().draw_calls(), 1);
    }

    #[test]
    fn test_idle_renderer_does_not_draw() {
        let mut r = renderer();
        assert_eq!(r.frame(input(0.0, moving(0.0, 0.0))), FrameStatus::Stopped);
        assert_eq!(r.backend().draw_calls(), 0);
    }

    #[test]
    fn test_dispose_makes_everything_a_noop() {
        let mut r = renderer();
        r.start();
        r.frame(input(0.0, moving(0.0, 0.0)));
        r.frame(input(16.0, moving(0.9, 0.9)));
        assert_eq!(r.backend().draw_calls(), 2);

        r.dispose();
        assert!(r.state().is_disposed());
        assert!(r.backend().is_disposed());
        assert_eq!(r.backend().live_markers(), 0);

        assert!(!r.on_sample(moving(-0.9, -0.9), 32.0).unwrap());
        assert!(!r.ingest_scene(Vec3::new(3.0, 3.0, 0.0), 32.0).unwrap());
        assert_eq!(r.frame(input(48.0, moving(0.5, 0.5))), FrameStatus::Stopped);
        assert!(r.tick(input(64.0, moving(0.1, 0.1))).is_ok());
        r.decay(80.0);
        assert!(r.resize(10, 10).is_ok());
        r.dispose();

        assert_eq!(r.points().count(), 0);
        assert_eq!(r.markers().len(), 0);
        assert_eq!(r.backend().draw_calls(), 2);
        assert!(!r.start());
    }

    #[test]
    fn test_every_marker_released_exactly_once() {
        let mut r = renderer();
        r.start();
        let mut now = 0.0;
        for i in 0..400 {
            let t = i as f32 * 0.37;
            r.frame(input(now, moving(t.sin() * 0.9, (t * 1.3).cos() * 0.9)));
            now += 40.0;
        }
        let created = r.backend().markers_created();
        assert!(created > 0);

        r.dispose();
        assert_eq!(r.backend().markers_released(), created);
        assert_eq!(r.backend().live_markers(), 0);
    }

    #[test]
    fn test_resize_keeps_trail() {
        let mut r = renderer();
        for i in 0..5 {
            r.ingest_scene(spaced(i), 0.0).unwrap();
        }
        r.resize(640, 480).unwrap();
        assert_eq!(r.backend().size(), (640, 480));
        assert_eq!(r.points().count(), 5);
        assert_eq!(r.markers().len(), 5);
        assert!((r.camera().aspect() - 640.0 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn test_recoverable_draw_error_skips_frame() {
        let mut r = renderer();
        r.start();
        r.backend_mut().fail_next_draw(TrailError::Resource("buffer upload".into()));
        assert_eq!(r.frame(input(0.0, PointerSample::default())), FrameStatus::Skipped);
        assert!(r.state().is_running());
        assert_eq!(r.stats().skipped_frames, 1);

        assert_eq!(r.frame(input(16.0, PointerSample::default())), FrameStatus::Drawn);
    }

    #[test]
    fn test_fatal_draw_error_disposes() {
        let mut r = renderer();
        r.start();
        r.frame(input(0.0, moving(0.0, 0.0)));
        r.backend_mut().fail_next_draw(TrailError::ContextLost);
        assert_eq!(r.frame(input(16.0, PointerSample::default())), FrameStatus::Stopped);
        assert!(r.state().is_disposed());
        assert_eq!(r.backend().live_markers(), 0);
    }

    #[test]
    fn test_marker_creation_failure_records_nothing() {
        let mut r = renderer();
        r.backend_mut()
            .fail_marker_creation(Some(TrailError::Resource("out of buffers".into())));
        assert!(r.ingest_scene(Vec3::ZERO, 0.0).is_err());
        assert_eq!(r.points().count(), 0);
        assert_eq!(r.markers().len(), 0);

        r.backend_mut().fail_marker_creation(None);
        assert!(r.ingest_scene(Vec3::ZERO, 0.0).unwrap());
    }

    #[test]
    fn test_non_finite_clock_keeps_markers_paired_with_points() {
        let mut r = renderer();
        r.start();
        r.frame(input(0.0, moving(0.0, 0.0)));
        assert_eq!(r.markers().len(), 1);

        r.frame(input(f64::NAN, PointerSample::default()));
        assert_eq!(r.points().count(), 0);
        assert_eq!(r.markers().len(), 0);
        assert_eq!(r.backend().live_markers(), 0);
    }

    #[test]
    fn test_zero_marker_opacity_is_rejected() {
        let config = TrailConfig {
            marker_opacity: 0.0,
            ..TrailConfig::default()
        };
        assert!(TrailRenderer::initialize(config, HeadlessBackend::new(), 100, 100).is_err());
    }

    #[test]
    fn test_invalid_config_disposes_backend() {
        let config = TrailConfig {
            max_points: 0,
            ..TrailConfig::default()
        };
        assert!(TrailRenderer::initialize(config, HeadlessBackend::new(), 100, 100).is_err());
    }
}
