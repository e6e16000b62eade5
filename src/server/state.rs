use crate::{
    config::Config,
    error::Result,
    hls::{ManifestRewriter, ProxyUrlBuilder},
    history::{HistoryStore, MemoryHistoryStore},
    upstream::UpstreamFetcher,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Origin client with the spoofed browser identity
    pub fetcher: UpstreamFetcher,
    /// Playlist rewriter, pure and shared
    pub rewriter: Arc<ManifestRewriter>,
    /// Recently played streams
    pub history: Arc<dyn HistoryStore>,
    /// Prometheus render handle
    pub metrics: PrometheusHandle,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = UpstreamFetcher::new(&config)?;
        let rewriter = ManifestRewriter::new(
            ProxyUrlBuilder::new(config.public_base_url.clone()),
            config.rewrite_tag_uris,
        );
        let history = MemoryHistoryStore::new(config.history_limit);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            rewriter: Arc::new(rewriter),
            history: Arc::new(history),
            metrics: crate::metrics::init(),
            started_at: Instant::now(),
        })
    }
}
