//! Stitch palette
//!
//! White thread on whatever the page draws underneath; the surface itself
//! clears to fully transparent.

pub mod colors {
    /// Marker crosses
    pub const STITCH_RGB: [f32; 3] = [1.0, 1.0, 1.0];
    /// Per-vertex color of the shared line mesh
    pub const LINE_RGB: [f32; 3] = [1.0, 1.0, 1.0];
    /// Surface clear color (premultiplied, fully transparent)
    pub const CLEAR_RGBA: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
}
