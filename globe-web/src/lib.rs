#![cfg(target_arch = "wasm32")]

use std::cell::OnceCell;

use globe_common::GeoCoord;
use globe_renderer::app::{ApplicationEvent, ApplicationRunner};

use color_eyre::{
    Report, Result,
    eyre::{OptionExt, eyre},
};
use tokio_with_wasm::alias as tokio;
use wasm_bindgen::prelude::*;
use winit::window::Window;

thread_local! {
    pub static EVENT_LOOP_PROXY: OnceCell<winit::event_loop::EventLoopProxy<ApplicationEvent>> =
        OnceCell::new();
}

fn send(event: ApplicationEvent) {
    EVENT_LOOP_PROXY.with(|cell| match cell.get() {
        Some(proxy) => {
            if let Err(err) = proxy.send_event(event) {
                log::error!("{err}");
            }
        }
        None => {
            log::error!("Globe not initialized yet");
        }
    })
}

/// Flies the camera to the given coordinates.
#[wasm_bindgen]
pub fn focus_on_location(latitude: f64, longitude: f64) {
    match GeoCoord::new(latitude, longitude) {
        Ok(coord) => send(ApplicationEvent::FocusLocation(coord)),
        Err(err) => log::error!("{err}"),
    }
}

/// Remembers a custom marker model URL for the next marker rebuild.
#[wasm_bindgen]
pub fn set_marker_model(url: String) {
    send(ApplicationEvent::SetMarkerModel(url));
}

/// Reloads the location set and rebuilds the markers, optionally with a
/// new model URL.
#[wasm_bindgen]
pub fn update_markers(url: Option<String>) {
    send(ApplicationEvent::UpdateMarkers(url));
}

#[wasm_bindgen]
pub fn set_bloom_settings(strength: f32, radius: f32, threshold: f32) {
    send(ApplicationEvent::SetBloomSettings {
        strength,
        radius,
        threshold,
    });
}

/// Opts a single marker in or out of the bloom layer.
#[wasm_bindgen]
pub fn set_marker_bloom(index: usize, enabled: bool) {
    send(ApplicationEvent::SetMarkerBloom { index, enabled });
}

#[tokio::main(flavor = "multi_thread")]
pub async fn async_start() -> Result<()> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info).expect("could not initialize logger");

    use wasm_bindgen::JsCast;
    use winit::platform::web::WindowAttributesExtWebSys;
    match wgpu::web_sys::window()
        .ok_or_eyre("Unable to get window")?
        .document()
        .ok_or_eyre("Unable to get document")?
        .get_element_by_id("canvas")
        .ok_or_eyre("Unable to get canvas by id \"canvas\"")?
        .dyn_into::<wgpu::web_sys::HtmlCanvasElement>()
        .map_err(|_| eyre!("Unable to convert canvas to HtmlCanvasElement"))
    {
        Ok::<_, Report>(canvas) => {
            let window_attributes = Window::default_attributes().with_canvas(Some(canvas));
            let mut app_runner = ApplicationRunner::new(window_attributes);
            EVENT_LOOP_PROXY.with(|cell| cell.set(app_runner.get_event_loop_proxy()).ok());
            if let Err(err) = app_runner.configure_background_runner(|f| tokio::spawn(f)) {
                log::error!("{err:?}");
            }
            Ok(app_runner.run()?)
        }
        Err(err) => {
            log::error!("{err:?}");
            Err(err)
        }
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    let _ = async_start();
}
