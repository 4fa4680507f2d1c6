use std::path::Path;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use color_eyre::Result;
use config::Config;
use globe_common::{Location, sort_newest_first};
use http::{Method, header};
use serde::Deserialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tower::ServiceBuilder;
use tower_http::CompressionLevel;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone, Deserialize)]
struct Settings {
    data_dir: String,
}

impl Settings {
    fn from_config(settings: Config) -> Result<Self> {
        let settings = settings.try_deserialize()?;

        Ok(settings)
    }
}

/// The location set is loaded once at startup and immutable afterwards;
/// the data file stands in for the externally owned store.
#[derive(Clone)]
struct AppState {
    locations: Arc<Vec<Location>>,
    data_dir: String,
}

impl AppState {
    async fn load(settings: Settings) -> Self {
        let file_name = Path::new(&settings.data_dir).join("locations.json");
        let locations = match tokio::fs::read(&file_name).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<Location>>(&bytes) {
                Ok(mut locations) => {
                    sort_newest_first(&mut locations);
                    locations
                }
                Err(err) => {
                    log::error!("Unable to parse {}: {err}", file_name.display());
                    vec![]
                }
            },
            Err(err) => {
                log::error!("Unable to read {}: {err}", file_name.display());
                vec![]
            }
        };
        log::info!("Serving {} locations", locations.len());

        Self {
            locations: Arc::new(locations),
            data_dir: settings.data_dir,
        }
    }
}

/// All locations, newest first.
async fn get_locations(State(state): State<AppState>) -> Json<Vec<Location>> {
    Json(state.locations.as_ref().clone())
}

/// Streams an earth texture file. A missing file answers with an empty
/// body; the renderer falls back to a generated placeholder.
async fn get_texture(
    State(state): State<AppState>,
    UrlPath(file_name): UrlPath<String>,
) -> impl IntoResponse {
    // The path parameter never traverses out of the textures directory.
    let file_name = Path::new(&state.data_dir)
        .join("textures")
        .join(Path::new(&file_name).file_name().unwrap_or_default());

    match File::open(file_name).await {
        Ok(file) => {
            let stream = ReaderStream::with_capacity(file, 256 * 1024);
            let body = Body::from_stream(stream);

            ([(header::CONTENT_TYPE, "image/jpeg")], body)
        }
        Err(_) => {
            let body = Body::empty();
            ([(header::CONTENT_TYPE, "text/html")], body)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    log::info!("Starting api backend service");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    let settings = Config::builder()
        .add_source(config::File::with_name("Settings"))
        .add_source(config::Environment::with_prefix("GLOBE"))
        .set_default("address", "0.0.0.0")?
        .set_default("port", 3000)?
        .set_default("data_dir", "globe-backend/data")?
        .build()
        .unwrap();

    let address = settings.get_string("address")?;
    let port = settings.get_int("port")?;

    let state = AppState::load(Settings::from_config(settings)?).await;

    let app = Router::new()
        .route("/api/locations", get(get_locations))
        .layer(
            ServiceBuilder::new().layer(
                CompressionLayer::new()
                    .zstd(true)
                    .quality(CompressionLevel::Fastest),
            ),
        )
        .route("/assets/textures/{file_name}", get(get_texture))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("{address}:{port}"))
        .await
        .unwrap();
    axum::serve(listener, app).await.unwrap();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_data_file_serves_an_empty_set() {
        let state = AppState::load(Settings {
            data_dir: "does-not-exist".into(),
        })
        .await;
        assert!(state.locations.is_empty());
    }

    #[test]
    fn seed_data_parses_and_sorts_newest_first() {
        let bytes = include_bytes!("../data/locations.json");
        let mut locations: Vec<Location> = serde_json::from_slice(bytes).unwrap();
        assert!(!locations.is_empty());

        sort_newest_first(&mut locations);
        for pair in locations.windows(2) {
            assert!(pair[0].date_added >= pair[1].date_added);
        }
    }
}
