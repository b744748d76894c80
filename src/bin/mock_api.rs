//! Travelog mock API
//!
//! A stand-in for the remote read-only API, for working offline. Point the
//! CLI at it with `api_base_url: http://127.0.0.1:8090/`.
//!
//! # Configuration
//!
//! Environment variables:
//! - `TRAVELOG_MOCK_PORT`: Port to listen on (default: 8090)
//! - `TRAVELOG_MOCK_FIXTURES`: JSON file with `destinations` and `trips`
//!   arrays in the remote wire format (default: a built-in sample)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /destination`: All destinations
//! - `GET /trips`: All trips
//! - `GET /pictures/{id}`: Placeholder picture for the built-in sample

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travelog::sync::{ApiDestination, ApiTrip};

/// 1x1 transparent GIF
const PLACEHOLDER_PICTURE: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Mock server configuration
#[derive(Debug, Clone)]
struct Config {
    port: u16,
    fixtures_path: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Self {
        let port = std::env::var("TRAVELOG_MOCK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8090);
        let fixtures_path = std::env::var("TRAVELOG_MOCK_FIXTURES")
            .ok()
            .map(PathBuf::from);

        Self {
            port,
            fixtures_path,
        }
    }
}

/// Everything the mock serves
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Fixtures {
    destinations: Vec<ApiDestination>,
    trips: Vec<ApiTrip>,
}

impl Fixtures {
    fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read fixtures '{}': {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse fixtures '{}': {}", path.display(), e))
    }

    /// A few destinations and trips, with pictures served by this mock.
    fn sample(base_url: &str) -> Self {
        let destination = |id: i64, city: &str, country: &str| ApiDestination {
            id,
            city: city.to_string(),
            country: country.to_string(),
            picture_url: format!("{}pictures/{}", base_url, id),
        };
        let trip = |id: i64, title: &str, destination_id: i64, start: (i32, u32, u32), days: i64| {
            let start_date = chrono::NaiveDate::from_ymd_opt(start.0, start.1, start.2)
                .unwrap_or(chrono::NaiveDate::MIN);
            ApiTrip {
                id,
                title: title.to_string(),
                destination_id,
                start_date,
                end_date: start_date + chrono::Duration::days(days - 1),
            }
        };

        Self {
            destinations: vec![
                destination(1, "Kyoto", "Japan"),
                destination(2, "Lisbon", "Portugal"),
                destination(3, "Cusco", "Peru"),
                destination(4, "Reykjavik", "Iceland"),
            ],
            trips: vec![
                trip(1, "Temples and tea", 1, (2024, 4, 2), 6),
                trip(2, "Weekend by the Tagus", 2, (2024, 6, 14), 3),
                trip(3, "Inca Trail", 3, (2024, 8, 1), 12),
                trip(4, "Northern lights", 4, (2025, 1, 20), 5),
                // Points at a destination the API does not list
                trip(5, "Somewhere new", 42, (2025, 3, 1), 2),
            ],
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn destinations(State(fixtures): State<Arc<Fixtures>>) -> Json<Vec<ApiDestination>> {
    Json(fixtures.destinations.clone())
}

async fn trips(State(fixtures): State<Arc<Fixtures>>) -> Json<Vec<ApiTrip>> {
    Json(fixtures.trips.clone())
}

async fn picture() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/gif")],
        PLACEHOLDER_PICTURE,
    )
}

fn app(fixtures: Fixtures) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/destination", get(destinations))
        .route("/trips", get(trips))
        .route("/pictures/{id}", get(picture))
        .with_state(Arc::new(fixtures))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travelog_mock_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let fixtures = match &config.fixtures_path {
        Some(path) => match Fixtures::load(path) {
            Ok(fixtures) => {
                tracing::info!("Loaded fixtures from {}", path.display());
                fixtures
            }
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("Serving built-in sample data");
            Fixtures::sample(&format!("http://127.0.0.1:{}/", config.port))
        }
    };
    tracing::info!(
        "{} destination(s), {} trip(s)",
        fixtures.destinations.len(),
        fixtures.trips.len()
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting mock API on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(fixtures)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
