use super::{ProxyParams, ProxyTarget};
use crate::{
    error::Result,
    metrics,
    server::{state::AppState, url_validation::validate_target_url},
};
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::info;

/// Content type of every rewritten playlist
pub const HLS_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Fetch a playlist from its origin and rewrite its URIs through the proxy
pub async fn serve_manifest(
    Query(params): Query<ProxyParams>,
    State(state): State<AppState>,
) -> Response {
    let start = Instant::now();

    let response = proxy_manifest(params, &state).await.into_response();

    metrics::record_request("manifest", response.status().as_u16());
    metrics::record_duration("manifest", start);

    response
}

async fn proxy_manifest(params: ProxyParams, state: &AppState) -> Result<Response> {
    let target = ProxyTarget::from_params(params)?;

    if state.config.block_private_targets {
        validate_target_url(target.target_url())?;
    }

    info!("Fetching playlist from origin: {}", target.target_url());

    let raw = state
        .fetcher
        .fetch_text(target.target_url(), target.referrer())
        .await?;

    // Resolve against the URL the client asked for, even if the origin redirected.
    let playlist = state
        .rewriter
        .rewrite(&raw, target.target_url(), target.referrer())?;

    metrics::record_playlist_lines(playlist.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HLS_CONTENT_TYPE),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        playlist.to_string(),
    )
        .into_response())
}
