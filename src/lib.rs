//! Referrer-spoofing HLS proxy.
//!
//! Playlists fetched through `/api/proxy/manifest` come back with every URI
//! line pointing at this service again, so nested playlists and media
//! segments keep flowing through the proxy with the same `Referer`.

pub mod config;
pub mod error;
pub mod history;
pub mod hls;
pub mod metrics;
pub mod server;
pub mod upstream;
