use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tracing::debug;

use super::{models::HealthResponse, state::AppState, utils};
use crate::api::error::ApiError;
use crate::offline::upstream::is_hop_by_hop;
use crate::offline::{CACHE_STATUS_HEADER, ControlMessage, OfflineResponse, ProxyRequest};

/// Liveness of the proxy itself (GET /_offline/health)
///
/// Reports the cache generation and lifecycle state; says nothing about the
/// origin, which is allowed to be down.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_version: state.service.version().to_string(),
        state: state.service.state(),
    };

    (StatusCode::OK, Json(response))
}

/// Cache counters (GET /_offline/metrics)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Control channel (POST /_offline/messages)
///
/// Body is a JSON object tagged by `type`: `get-version`, `clear-cache`,
/// `skip-waiting` or `sync-data`.
pub async fn control_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    utils::parse_content_type(content_type)?;

    let bytes = read_body(body, state.config.server.max_request_bytes.as_usize()).await?;
    let message: ControlMessage = serde_json::from_slice(&bytes)?;

    let reply = state.service.handle_message(message).await;
    Ok(Json(reply))
}

/// Everything that is not `/_offline/*` goes through the cache
pub async fn proxy(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    // Decompression already handled by RequestDecompressionLayer
    let body = read_body(body, state.config.server.max_request_bytes.as_usize()).await?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let request = ProxyRequest {
        method: parts.method,
        path_and_query,
        headers: utils::collect_headers(&parts.headers),
        body: body.into(),
    };

    let answer = state.service.handle(&request).await;
    debug!(
        method = %request.method,
        path = %request.path_and_query,
        status = answer.response.status,
        cache = answer.cache.as_str(),
        "Request served"
    );

    Ok(into_http_response(answer))
}

fn into_http_response(answer: OfflineResponse) -> Response {
    let status =
        StatusCode::from_u16(answer.response.status as u16).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = Response::new(Body::from(answer.response.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for entry in answer.response.headers {
        if is_hop_by_hop(&entry.name) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(entry.name.as_bytes()),
            HeaderValue::from_str(&entry.value),
        ) {
            headers.append(name, value);
        }
    }
    headers.insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(answer.cache.as_str()),
    );

    response
}

/// Reads request body and validates size
async fn read_body(body: Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .to_bytes()
        .to_vec();

    utils::validate_body_size(&data, max_size)?;

    Ok(data)
}
