//! HTTP surface.
//!
//! - `GET /reverse-geocode?latitude=&longitude=&platform=`
//! - `GET /geocode?address=&platform=`
//! - `GET /geocoders` (alias `/reversers`): reverse providers
//! - `GET /geocoders/forward`: forward providers
//! - `GET /health`
//!
//! Geocoding handlers always answer with an [`Envelope`]; the status code
//! carries the error class.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use geocoding_core::{
    Envelope, ErrorKind, Gateway, GeocodeError, GeocodeResponse, GeocodersResponse,
    ReverseGeocodeResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeParams {
    pub latitude: f64,
    pub longitude: f64,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub address: String,
    pub platform: Option<String>,
}

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/reverse-geocode", get(reverse_geocode))
        .route("/geocode", get(geocode))
        .route("/geocoders", get(list_reversers))
        .route("/reversers", get(list_reversers))
        .route("/geocoders/forward", get(list_geocoders))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn serve(gateway: Arc<Gateway>, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

pub fn status_for(err: &GeocodeError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream | ErrorKind::Parse => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn respond<T>(result: Result<Vec<T>, GeocodeError>) -> (StatusCode, Json<Envelope<T>>) {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err),
    };
    (status, Json(Envelope::from(result)))
}

fn rejected<T>(rejection: QueryRejection) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(Envelope::failure(rejection.body_text())),
    )
}

async fn reverse_geocode(
    State(gateway): State<Arc<Gateway>>,
    params: Result<Query<ReverseGeocodeParams>, QueryRejection>,
) -> (StatusCode, Json<ReverseGeocodeResponse>) {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return rejected(rejection),
    };

    let result = gateway
        .reverse_geocode(params.latitude, params.longitude, params.platform.as_deref())
        .await;
    respond(result)
}

async fn geocode(
    State(gateway): State<Arc<Gateway>>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> (StatusCode, Json<GeocodeResponse>) {
    let Query(params) = match params {
        Ok(query) => query,
        Err(rejection) => return rejected(rejection),
    };

    respond(gateway.geocode(&params.address, params.platform.as_deref()).await)
}

async fn list_reversers(State(gateway): State<Arc<Gateway>>) -> Json<GeocodersResponse> {
    Json(GeocodersResponse { geocoders: gateway.reversers().list() })
}

async fn list_geocoders(State(gateway): State<Arc<Gateway>>) -> Json<GeocodersResponse> {
    Json(GeocodersResponse { geocoders: gateway.geocoders().list() })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
