//! Overlay canvas: full-viewport, behind page content, click-through

use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement};

use super::js_err;
use crate::core::{TrailError, TrailResult};

const CANVAS_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", "0"),
    ("left", "0"),
    ("width", "100%"),
    ("height", "100vh"),
    ("pointer-events", "none"),
    ("z-index", "1"),
];

/// Canvas appended to the host container; removed again on drop
pub struct Overlay {
    canvas: HtmlCanvasElement,
}

impl Overlay {
    pub fn attach(document: &Document, container: &Element) -> TrailResult<Self> {
        let canvas = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| TrailError::Unsupported("canvas element".into()))?;

        let style = canvas.style();
        for &(property, value) in CANVAS_STYLE {
            style.set_property(property, value).map_err(js_err)?;
        }

        container.append_child(&canvas).map_err(js_err)?;
        debug!(container = %container.id(), "Overlay canvas attached");
        Ok(Self { canvas })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Set the backing store size in device pixels.
    pub fn set_pixel_size(&self, width: u32, height: u32) {
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
    }

    /// Keep the canvas aligned with the window while the page scrolls.
    pub fn set_scroll_offset(&self, offset: f64) {
        // Style writes only fail on a detached declaration; nothing to do then
        let _ = self
            .canvas
            .style()
            .set_property("transform", &format!("translateY({}px)", offset));
    }

    pub fn detach(&self) {
        self.canvas.remove();
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        self.detach();
    }
}
