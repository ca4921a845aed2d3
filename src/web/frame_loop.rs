//! `requestAnimationFrame` driver
//!
//! The frame closure reschedules itself until the renderer reports
//! [`FrameStatus::Stopped`] or [`FrameLoop::stop`] cancels it. It only holds
//! a weak handle to the renderer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use super::gl::WebGlBackend;
use super::js_err;
use crate::core::{FrameInput, FrameStatus, PointerReader, TrailRenderer, TrailResult};
use crate::time::now_ms;

pub type SharedRenderer = Rc<RefCell<TrailRenderer<WebGlBackend>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub struct FrameLoop {
    window: Window,
    callback: FrameCallback,
    /// Id of the requested but not yet delivered frame
    pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn start(window: Window, renderer: &SharedRenderer, reader: PointerReader) -> TrailResult<Self> {
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(renderer);
        let next = callback.clone();
        let pending_next = pending.clone();
        let win = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            pending_next.set(None);
            let Some(renderer) = weak.upgrade() else {
                return;
            };

            let now = now_ms();
            let input = FrameInput {
                now_ms: now,
                pointer: reader.sample(now),
                scroll_offset: win.scroll_y().unwrap_or(0.0),
            };
            if renderer.borrow_mut().frame(input) == FrameStatus::Stopped {
                return;
            }

            if let Some(closure) = next.borrow().as_ref() {
                match win.request_animation_frame(closure.as_ref().unchecked_ref()) {
                    Ok(id) => pending_next.set(Some(id)),
                    Err(e) => error!(error = ?e, "requestAnimationFrame failed"),
                }
            }
        }) as Box<dyn FnMut(f64)>));

        renderer.borrow_mut().start();

        // Dropping `frame_loop` on failure breaks the closure's self-reference
        let frame_loop = Self {
            window,
            callback,
            pending,
        };
        frame_loop.request_frame()?;
        info!("Frame loop started");
        Ok(frame_loop)
    }

    fn request_frame(&self) -> TrailResult<()> {
        let slot = self.callback.borrow();
        let Some(closure) = slot.as_ref() else {
            return Ok(());
        };
        let id = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map_err(js_err)?;
        self.pending.set(Some(id));
        Ok(())
    }

    /// Cancel the pending frame and drop the closure. Idempotent.
    pub fn stop(&self) {
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        if self.callback.borrow_mut().take().is_some() {
            info!("Frame loop stopped");
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
