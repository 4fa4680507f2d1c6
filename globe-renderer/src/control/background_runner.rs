use std::sync::Arc;

use color_eyre::Result;
use globe_common::Location;
use tokio::{
    select,
    sync::mpsc::Receiver,
    task::{JoinSet, spawn_blocking},
};
use tokio_with_wasm::alias as tokio;
use winit::event_loop::EventLoopProxy;

use crate::{
    app::{ApplicationEvent, ApplicationSettings},
    control::model::parse_obj,
    render::texture::{DecodedTexture, EarthTextures, decode_image, placeholder_texture},
};

#[derive(Debug)]
pub enum BackgroundEvent {
    FetchLocations,
    FetchEarthTextures,
    FetchMarkerModel(String),
}

/// Handles the async side of the application: fetching locations, textures
/// and marker models off the render thread, handing results back through
/// the event loop proxy. Every failure degrades locally — an empty
/// location set, a placeholder texture, the primitive marker — and is
/// logged rather than surfaced.
#[derive(Debug)]
pub struct BackgroundRunner {
    event_receiver: Receiver<BackgroundEvent>,
    render_event_loopback: EventLoopProxy<ApplicationEvent>,
    settings: Arc<ApplicationSettings>,
    running_tasks: JoinSet<Result<()>>,
}

async fn fetch_bytes(url: &str) -> Result<Option<Vec<u8>>> {
    let response = reqwest::get(url).await?.error_for_status()?.bytes().await?;
    if response.is_empty() {
        Ok(None)
    } else {
        Ok(Some(response.to_vec()))
    }
}

/// Any fetch or parse error yields an empty location set; the globe then
/// simply renders with no markers.
pub async fn fetch_locations(backend_url: &str) -> Vec<Location> {
    let url = format!("{backend_url}/api/locations");
    match fetch_bytes(&url).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(locations) => locations,
            Err(err) => {
                log::error!("Unable to parse location data: {err}");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(err) => {
            log::error!("Unable to load location data: {err}");
            Vec::new()
        }
    }
}

async fn fetch_texture(url: String, fallback_color: [u8; 3]) -> DecodedTexture {
    let bytes = match fetch_bytes(&url).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::error!("Empty texture response from {url}, using placeholder");
            return placeholder_texture(fallback_color);
        }
        Err(err) => {
            log::error!("Failed to load texture {url}: {err}, using placeholder");
            return placeholder_texture(fallback_color);
        }
    };

    match spawn_blocking(move || decode_image(&bytes)).await {
        Ok(Ok(texture)) => texture,
        Ok(Err(err)) => {
            log::error!("Failed to decode texture {url}: {err}, using placeholder");
            placeholder_texture(fallback_color)
        }
        Err(err) => {
            log::error!("Texture decode task failed: {err}");
            placeholder_texture(fallback_color)
        }
    }
}

async fn fetch_marker_model(url: &str) -> Option<crate::data::markers::MarkerModel> {
    let bytes = match fetch_bytes(url).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            log::error!("Empty marker model response from {url}, keeping primitive markers");
            return None;
        }
        Err(err) => {
            log::error!("Failed to load marker model {url}: {err}, keeping primitive markers");
            return None;
        }
    };

    let source = String::from_utf8_lossy(&bytes).into_owned();
    match spawn_blocking(move || parse_obj(&source)).await {
        Ok(Ok(model)) => Some(model),
        Ok(Err(err)) => {
            log::error!("Failed to parse marker model {url}: {err}, keeping primitive markers");
            None
        }
        Err(err) => {
            log::error!("Marker model parse task failed: {err}");
            None
        }
    }
}

impl BackgroundRunner {
    pub fn new(
        event_receiver: Receiver<BackgroundEvent>,
        render_event_loopback: EventLoopProxy<ApplicationEvent>,
        settings: Arc<ApplicationSettings>,
    ) -> Self {
        Self {
            event_receiver,
            render_event_loopback,
            settings,
            running_tasks: JoinSet::new(),
        }
    }

    pub async fn process_event(
        render_event_loopback: EventLoopProxy<ApplicationEvent>,
        settings: Arc<ApplicationSettings>,
        event: BackgroundEvent,
    ) -> Result<()> {
        use BackgroundEvent::*;

        let backend_url = settings.backend_url.as_str();

        match event {
            FetchLocations => {
                let locations = fetch_locations(backend_url).await;
                if let Err(err) =
                    render_event_loopback.send_event(ApplicationEvent::LocationsReady(locations))
                {
                    log::error!("{err}");
                }
            }
            FetchEarthTextures => {
                let day = fetch_texture(
                    format!("{backend_url}/assets/textures/earth_diffuse.jpg"),
                    [0x1a, 0x4f, 0x9c],
                )
                .await;
                let bump = fetch_texture(
                    format!("{backend_url}/assets/textures/earth_bump.jpg"),
                    [0x55, 0x55, 0x55],
                )
                .await;
                if let Err(err) = render_event_loopback
                    .send_event(ApplicationEvent::EarthTexturesReady(EarthTextures {
                        day,
                        bump,
                    }))
                {
                    log::error!("{err}");
                }
            }
            FetchMarkerModel(url) => {
                let model = fetch_marker_model(&url).await;
                if let Err(err) =
                    render_event_loopback.send_event(ApplicationEvent::MarkerModelReady(model))
                {
                    log::error!("{err}");
                }
            }
        }

        Ok(())
    }

    pub async fn run(&mut self) {
        loop {
            select! {
                Some(event) = self.event_receiver.recv() => {
                    let sender = self.render_event_loopback.clone();
                    let settings = Arc::clone(&self.settings);
                    self.running_tasks.spawn(async {
                        Ok(Self::process_event(sender, settings, event).await?)
                    });
                    log::info!("Background tasks running: {}", self.running_tasks.len());
                }
                Some(result) = self.running_tasks.join_next() => {
                    if let Err(err) = result {
                        log::error!("Error in a background task: {err:?}");
                    }
                    log::info!("Task finished, still running: {}", self.running_tasks.len());
                }
            }
        }
    }
}
