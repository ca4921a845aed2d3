//! Stitch markers: small decaying crosses, one per recorded point
//!
//! `MarkerSet` is the sole owner of marker resources. Every path that drops a
//! marker (capacity eviction, decay sweep, teardown) hands the resource back
//! to the backend.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::trace;

use super::backend::RenderBackend;
use super::config::TrailConfig;

/// Fade progress in [0, 1] for an entity of the given age.
#[inline]
pub fn fade_progress(age_ms: f64, fade_ms: f64) -> f64 {
    (age_ms / fade_ms).clamp(0.0, 1.0)
}

/// Marker opacity: linear fade from `base_opacity` to exactly 0 at `fade_ms`.
#[inline]
pub fn marker_opacity(age_ms: f64, fade_ms: f64, base_opacity: f32) -> f32 {
    (1.0 - fade_progress(age_ms, fade_ms)) as f32 * base_opacity
}

/// Cosmetic pulse around scale 1.0
#[inline]
pub fn pulse_scale(now_ms: f64, index: usize, config: &TrailConfig) -> f32 {
    let phase = now_ms * config.pulse_speed + index as f64 * config.pulse_phase_step as f64;
    1.0 + phase.sin() as f32 * config.pulse_amplitude
}

/// A rendered cross at a stitch point
#[derive(Debug)]
pub struct StitchMarker<M> {
    pub position: Vec3,
    pub timestamp: f64,
    /// Static z rotation assigned at creation (radians)
    pub rotation: f32,
    pub opacity: f32,
    pub scale: f32,
    pub pending_removal: bool,
    resource: M,
}

impl<M> StitchMarker<M> {
    pub fn new(position: Vec3, timestamp: f64, rotation: f32, opacity: f32, resource: M) -> Self {
        Self {
            position,
            timestamp,
            rotation,
            opacity,
            scale: 1.0,
            pending_removal: false,
            resource,
        }
    }

    pub fn resource(&self) -> &M {
        &self.resource
    }
}

/// Ordered marker collection, oldest first
#[derive(Debug)]
pub struct MarkerSet<M> {
    markers: VecDeque<StitchMarker<M>>,
}

impl<M> MarkerSet<M> {
    pub fn new(capacity: usize) -> Self {
        Self {
            markers: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, marker: StitchMarker<M>) {
        self.markers.push_back(marker);
    }

    /// Drop the oldest marker, releasing its resource.
    pub fn evict_oldest<B>(&mut self, backend: &mut B) -> bool
    where
        B: RenderBackend<Marker = M>,
    {
        match self.markers.pop_front() {
            Some(marker) => {
                backend.release_marker(marker.resource);
                true
            }
            None => false,
        }
    }

    /// Recompute opacity and pulse for every marker and flag the fully
    /// faded ones.
    pub fn update(&mut self, now_ms: f64, config: &TrailConfig) {
        for (index, marker) in self.markers.iter_mut().enumerate() {
            let age = now_ms - marker.timestamp;
            marker.opacity = marker_opacity(age, config.fade_ms, config.marker_opacity);
            marker.scale = pulse_scale(now_ms, index, config);
            // NaN ages count as faded, matching how points are pruned
            if !(marker.opacity > 0.0) {
                marker.pending_removal = true;
            }
        }
    }

    /// Remove flagged markers, newest to oldest. Returns how many were removed.
    pub fn sweep<B>(&mut self, backend: &mut B) -> usize
    where
        B: RenderBackend<Marker = M>,
    {
        let mut removed = 0;
        for i in (0..self.markers.len()).rev() {
            if !self.markers[i].pending_removal {
                continue;
            }
            if let Some(marker) = self.markers.remove(i) {
                backend.release_marker(marker.resource);
                removed += 1;
            }
        }
        if removed > 0 {
            trace!(removed, remaining = self.markers.len(), "Faded markers swept");
        }
        removed
    }

    /// Release every marker. The only teardown path.
    pub fn release_all<B>(&mut self, backend: &mut B) -> usize
    where
        B: RenderBackend<Marker = M>,
    {
        let count = self.markers.len();
        for marker in self.markers.drain(..) {
            backend.release_marker(marker.resource);
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &StitchMarker<M>> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::headless::{HeadlessBackend, HeadlessMarker};

    fn marker_at(backend: &mut HeadlessBackend, timestamp: f64) -> StitchMarker<HeadlessMarker> {
        let resource = backend.create_marker(Vec3::ZERO, 0.0, 0.005).unwrap();
        StitchMarker::new(Vec3::ZERO, timestamp, 0.0, 0.9, resource)
    }

    #[test]
    fn test_opacity_is_monotone_and_reaches_zero() {
        let fade = 10_000.0;
        let mut prev = f32::MAX;
        for step in 0..=120 {
            let age = step as f64 * 100.0;
            let opacity = marker_opacity(age, fade, 0.9);
            assert!(opacity <= prev, "opacity increased at age {}", age);
            prev = opacity;
        }
        assert_eq!(marker_opacity(0.0, fade, 0.9), 0.9);
        assert_eq!(marker_opacity(fade, fade, 0.9), 0.0);
        assert_eq!(marker_opacity(fade + 1.0, fade, 0.9), 0.0);
        // Clock skew never brightens a marker past its base opacity
        assert_eq!(marker_opacity(-50.0, fade, 0.9), 0.9);
    }

    #[test]
    fn test_pulse_stays_within_amplitude() {
        let config = TrailConfig::default();
        for i in 0..50 {
            let scale = pulse_scale(i as f64 * 37.0, i, &config);
            assert!((0.9..=1.1).contains(&scale));
        }
    }

    #[test]
    fn test_sweep_removes_adjacent_flagged_markers() {
        let config = TrailConfig::default();
        let mut backend = HeadlessBackend::new();
        let mut set = MarkerSet::new(8);

        // Three expired markers in a row, then two fresh ones, then one expired
        for &ts in &[0.0, 10.0, 20.0, 15_000.0, 15_010.0, 30.0] {
            let marker = marker_at(&mut backend, ts);
            set.push(marker);
        }

        set.update(15_020.0, &config);
        let removed = set.sweep(&mut backend);

        assert_eq!(removed, 4);
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|m| m.timestamp >= 15_000.0));
        assert_eq!(backend.live_markers(), 2);
        assert_eq!(backend.markers_released(), 4);
    }

    #[test]
    fn test_non_finite_age_flags_marker() {
        let config = TrailConfig::default();
        let mut backend = HeadlessBackend::new();
        let mut set = MarkerSet::new(2);
        let marker = marker_at(&mut backend, 0.0);
        set.push(marker);

        set.update(f64::NAN, &config);
        assert_eq!(set.sweep(&mut backend), 1);
        assert!(set.is_empty());
        assert_eq!(backend.live_markers(), 0);
    }

    #[test]
    fn test_evict_and_release_all_return_resources() {
        let mut backend = HeadlessBackend::new();
        let mut set = MarkerSet::new(4);
        for ts in 0..4 {
            let marker = marker_at(&mut backend, ts as f64);
            set.push(marker);
        }

        assert!(set.evict_oldest(&mut backend));
        assert_eq!(set.iter().next().map(|m| m.timestamp), Some(1.0));

        assert_eq!(set.release_all(&mut backend), 3);
        assert!(set.is_empty());
        assert!(!set.evict_oldest(&mut backend));
        assert_eq!(backend.markers_created(), backend.markers_released());
    }
}
