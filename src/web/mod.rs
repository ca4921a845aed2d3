//! Browser side: overlay canvas, WebGL2 backend, pointer and frame loop
//!
//! `StitchTrail` is the handle the page host holds: mount on component
//! mount, `resize` on viewport changes (also wired to the window event),
//! `unmount` on teardown.

mod frame_loop;
mod gl;
mod listener;
mod overlay;
mod pointer;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::Window;

use crate::core::{TrailConfig, TrailError, TrailRenderer, TrailResult};
use frame_loop::{FrameLoop, SharedRenderer};
use gl::WebGlBackend;
use listener::EventListener;
use overlay::Overlay;
use pointer::track_pointer;

/// Optional page-provided overrides, e.g. `window.__stitch_config = { fade_ms: 6000 }`
const CONFIG_GLOBAL: &str = "__stitch_config";

pub(crate) fn js_err(e: JsValue) -> TrailError {
    TrailError::Js(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

impl From<TrailError> for JsValue {
    fn from(e: TrailError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

/// Window inner size in CSS pixels
pub(crate) fn viewport_size(window: &Window) -> (u32, u32) {
    let dimension = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32;
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

fn load_config(window: &Window) -> TrailConfig {
    let json = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
        .and_then(|v| js_sys::JSON::stringify(&v).ok())
        .map(String::from);

    match json {
        Some(json) => TrailConfig::from_json(&json).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring invalid {}", CONFIG_GLOBAL);
            TrailConfig::default()
        }),
        None => TrailConfig::default(),
    }
}

fn resize_to_window(renderer: &Weak<RefCell<TrailRenderer<WebGlBackend>>>, window: &Window) {
    let Some(renderer) = renderer.upgrade() else {
        return;
    };
    let (width, height) = viewport_size(window);
    if let Err(e) = renderer.borrow_mut().resize(width, height) {
        warn!(error = %e, width, height, "Resize failed");
    }
}

/// A running overlay. Field order is drop order: the frame loop is cancelled
/// before the listeners go away and the renderer is released.
struct Mounted {
    frame_loop: FrameLoop,
    _pointer: EventListener,
    _resize: EventListener,
    renderer: SharedRenderer,
    window: Window,
}

impl Mounted {
    fn mount(window: Window, container_id: &str, config: TrailConfig) -> TrailResult<Self> {
        let document = window
            .document()
            .ok_or_else(|| TrailError::Unsupported("no document".into()))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| TrailError::Unsupported(format!("no element #{}", container_id)))?;

        let overlay = Overlay::attach(&document, &container)?;
        let backend = WebGlBackend::new(overlay, config.max_pixel_ratio)?;

        let (width, height) = viewport_size(&window);
        let idle_timeout_ms = config.idle_timeout_ms;
        let renderer: SharedRenderer = Rc::new(RefCell::new(TrailRenderer::initialize(
            config, backend, width, height,
        )?));

        let (pointer, reader) = track_pointer(&window, idle_timeout_ms)?;
        let resize = {
            let weak = Rc::downgrade(&renderer);
            let win = window.clone();
            EventListener::new(&window, "resize", move |_| resize_to_window(&weak, &win))?
        };
        let frame_loop = FrameLoop::start(window.clone(), &renderer, reader)?;

        Ok(Self {
            frame_loop,
            _pointer: pointer,
            _resize: resize,
            renderer,
            window,
        })
    }

    fn unmount(self) {
        self.frame_loop.stop();
        self.renderer.borrow_mut().dispose();
    }
}

/// Handle exported to the page host
#[wasm_bindgen]
pub struct StitchTrail {
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl StitchTrail {
    /// Attach the overlay to the element with `container_id` and start the
    /// frame loop. Rejects if the environment cannot render; the page is left
    /// untouched in that case.
    pub fn mount(container_id: &str) -> Result<StitchTrail, JsValue> {
        let window = web_sys::window()
            .ok_or_else(|| TrailError::Unsupported("no window".into()))?;
        let config = load_config(&window);

        match Mounted::mount(window, container_id, config) {
            Ok(mounted) => {
                info!(container_id, "Stitch trail mounted");
                Ok(Self {
                    mounted: Some(mounted),
                })
            }
            Err(e) => {
                warn!(error = %e, "Stitch trail unavailable");
                Err(e.into())
            }
        }
    }

    /// Re-read the viewport size. Trail state is kept.
    pub fn resize(&self) {
        if let Some(mounted) = &self.mounted {
            resize_to_window(&Rc::downgrade(&mounted.renderer), &mounted.window);
        }
    }

    /// Stop the loop and release every resource. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.unmount();
            info!("Stitch trail unmounted");
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|m| m.renderer.borrow().state().is_running())
    }
}
