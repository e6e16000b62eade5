use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Result alias used across the proxy
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Request-scoped proxy errors. None of them are fatal to the process.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("Target not allowed: {0}")]
    InvalidTarget(String),

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Invalid URL reference '{input}': {source}")]
    MalformedUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Upstream fetch failed for {url}: {source}")]
    UpstreamFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream manifest {url} exceeds {limit} bytes")]
    ManifestTooLarge { url: String, limit: usize },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ProxyError {
    /// HTTP status this error maps onto.
    ///
    /// Every upstream failure collapses to 500, whatever the origin answered.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_)
            | ProxyError::InvalidTarget(_)
            | ProxyError::Validation { .. } => StatusCode::BAD_REQUEST,
            ProxyError::MalformedUrl { .. }
            | ProxyError::UpstreamFetch { .. }
            | ProxyError::ManifestTooLarge { .. }
            | ProxyError::HttpClient(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        let cors = [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")];

        match self {
            ProxyError::Validation { field, message } => (
                status,
                cors,
                Json(json!({ "message": message, "field": field })),
            )
                .into_response(),
            other => (status, cors, other.to_string()).into_response(),
        }
    }
}
