//! Windowed front ends for the two demos.

pub mod line_plot;
pub mod scene_view;

use std::sync::Arc;
use winit::{event_loop::ActiveEventLoop, window::Window};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub const CANVAS_ID: &str = "the_canvas_id";

pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        // A second init (e.g. both demos in one process) is harmless.
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Opens the native window, or binds to the page's canvas on the web.
pub(crate) fn create_window(event_loop: &ActiveEventLoop, title: &str) -> anyhow::Result<Arc<Window>> {
    #[allow(unused_mut)]
    let mut window_attributes = Window::default_attributes().with_title(title);

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        use winit::platform::web::WindowAttributesExtWebSys;

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| anyhow::anyhow!("no document"))?;
        let canvas = document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| anyhow::anyhow!("no element with id {CANVAS_ID}"))?;
        let html_canvas_element = canvas.unchecked_into();
        window_attributes = window_attributes.with_canvas(Some(html_canvas_element));

        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            loading_text.remove();
        }
    }

    Ok(Arc::new(event_loop.create_window(window_attributes)?))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_scene() -> Result<(), JsValue> {
    scene_view::run(crate::config::SceneConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_line_plot() -> Result<(), JsValue> {
    line_plot::run(crate::config::PlotConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
