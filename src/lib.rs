//! Stitch trail - decorative cursor-trail overlay
//!
//! Pointer motion is unprojected into a small 3D scene and leaves behind
//! white cross "stitches" joined by thread lines, all fading out over ten
//! seconds. The overlay sits behind page content and never takes input.
//!
//! - `core`: platform-agnostic trail state, camera, decay and frame logic
//! - `web` (wasm32 + `wasm` feature): WebGL2 backend and page lifecycle

pub mod core;
pub mod theme;
pub mod time;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use web::StitchTrail;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
use wasm_bindgen::prelude::*;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();
}
