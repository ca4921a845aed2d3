//! Platform-agnostic core module - shared between the WASM overlay and CLI

pub mod backend;
pub mod camera;
pub mod config;
pub mod error;
pub mod headless;
pub mod markers;
pub mod pointer;
pub mod renderer;
pub mod rng;
pub mod state;
pub mod stats;
pub mod trail;

pub use backend::{LineVertex, RenderBackend, SceneFrame};
pub use camera::Camera;
pub use config::TrailConfig;
pub use error::{TrailError, TrailResult};
pub use headless::{HeadlessBackend, HeadlessMarker};
pub use markers::{MarkerSet, StitchMarker};
pub use pointer::{pointer_channel, PointerReader, PointerSample, PointerWriter};
pub use renderer::{FrameInput, FrameStatus, TrailRenderer};
pub use rng::Jitter;
pub use state::LoopState;
pub use stats::{FpsCounter, FrameStats};
pub use trail::{StitchLine, StitchPoint, Trail};
