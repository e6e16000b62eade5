use super::{ProxyParams, ProxyTarget};
use crate::{
    error::Result,
    metrics,
    server::{state::AppState, url_validation::validate_target_url},
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::info;

/// Stream a segment from its origin to the client
///
/// The body is never buffered: hyper polls the upstream stream only as fast
/// as the client drains it, and a client disconnect drops (and closes) the
/// upstream connection.
pub async fn serve_segment(
    Query(params): Query<ProxyParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();

    let response = proxy_segment(params, &state).await.into_response();

    metrics::record_request("segment", response.status().as_u16());
    metrics::record_duration("segment", start);

    response
}

async fn proxy_segment(params: ProxyParams, state: &AppState) -> Result<Response> {
    let target = ProxyTarget::from_params(params)?;

    if state.config.block_private_targets {
        validate_target_url(target.target_url())?;
    }

    info!("Streaming segment from origin: {}", target.target_url());

    let upstream = state
        .fetcher
        .fetch_stream(target.target_url(), target.referrer())
        .await?;

    let content_type = upstream.content_type().cloned();

    let mut response = Body::from_stream(upstream.into_body_stream()).into_response();
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Some(content_type) = content_type {
        headers.insert(header::CONTENT_TYPE, content_type);
    }

    Ok(response)
}
