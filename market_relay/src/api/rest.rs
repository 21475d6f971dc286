// @file: market_relay/src/api/rest.rs
// @description: HTTP surface: OHLCV routes, health, maintenance gate, request log and the JSON error envelope.
// @author: LAS.

use crate::connectors::rest_dispatch::AdapterSet;
use crate::core::broadcaster::Broadcaster;
use crate::core::error::RelayError;
use crate::core::models::{CandlePage, CandleParams};
use crate::core::registry::ConnectionRegistry;
use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;


//
// STATE
//

#[derive(Clone)]
pub struct AppState {
    pub adapters: Arc<AdapterSet>,
    pub broadcaster: Broadcaster,
    pub registry: ConnectionRegistry,
    /// Some(message) while the maintenance gate is closed.
    pub maintenance: Option<String>,
}


//
// ROUTER
//

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/{exchange}/{endpoint}", get(fetch_ohlcv))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), maintenance_gate))
        .layer(middleware::from_fn(log_request))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}


//
// HANDLERS
//

async fn fetch_ohlcv(
    State(state): State<AppState>,
    Path((exchange, endpoint)): Path<(String, String)>,
    uri: Uri,
    Query(params): Query<CandleParams>,
) -> Result<Json<CandlePage>, RelayError> {
    let adapter = state
        .adapters
        .lookup(&exchange, &endpoint)
        .ok_or_else(|| endpoint_missing(&uri))?;

    adapter.fetch_candles(&params).await.map(Json)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let feeds: Vec<Value> = state
        .registry
        .states()
        .await
        .into_iter()
        .map(|(target, conn_state)| json!({ "target": target.to_string(), "state": conn_state }))
        .collect();

    Json(json!({
        "status": "ok",
        "subscribers": state.broadcaster.subscriber_count(),
        "feeds": feeds,
    }))
}

async fn not_found(uri: Uri) -> RelayError {
    endpoint_missing(&uri)
}

fn endpoint_missing(uri: &Uri) -> RelayError {
    RelayError::NotImplemented(format!("Endpoint - {} not found", uri))
}


//
// MIDDLEWARE
//

async fn maintenance_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match &state.maintenance {
        Some(message) => RelayError::Maintenance(message.clone()).into_response(),
        None => next.run(request).await,
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let peer: String = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    info!(
        "Api-{} {} from IP {} -> {} in {:.2}ms",
        method,
        uri,
        peer,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    response
}


//
// ERROR ENVELOPE
//

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "status": status.as_u16(),
            "type": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
