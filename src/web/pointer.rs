//! Pointer tracker: `mousemove` → latest-value cell

use wasm_bindgen::JsCast;
use web_sys::{MouseEvent, Window};

use super::listener::EventListener;
use super::viewport_size;
use crate::core::{pointer_channel, PointerReader, TrailResult};
use crate::time::now_ms;

/// Install the listener. The returned guard owns the writer side.
pub fn track_pointer(window: &Window, idle_timeout_ms: f64) -> TrailResult<(EventListener, PointerReader)> {
    let (writer, reader) = pointer_channel(idle_timeout_ms);
    let win = window.clone();
    let listener = EventListener::new(window, "mousemove", move |event| {
        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let (width, height) = viewport_size(&win);
        writer.record_move(
            mouse.client_x() as f64,
            mouse.client_y() as f64,
            width as f64,
            height as f64,
            now_ms(),
        );
    })?;
    Ok((listener, reader))
}
