use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Desktop Chrome user agent sent to origins that gate on browser traffic
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound on a buffered playlist body (16 MiB)
pub const DEFAULT_MAX_MANIFEST_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Prefix for rewritten proxy URLs. Empty keeps them root-relative.
    pub public_base_url: String,
    /// User-Agent presented to origins
    pub user_agent: String,
    /// Connect timeout for every upstream request, in seconds
    pub upstream_connect_timeout_secs: u64,
    /// Longest silence between upstream reads in seconds (0 disables).
    /// Resets on every chunk, so long segment transfers are unaffected.
    pub upstream_read_timeout_secs: u64,
    /// Whole-request timeout for playlist fetches in seconds (0 disables)
    pub manifest_timeout_secs: u64,
    /// Largest playlist body the proxy will buffer
    pub max_manifest_bytes: usize,
    /// Also rewrite `URI="..."` attributes inside tag lines
    pub rewrite_tag_uris: bool,
    /// Reject targets pointing at private or loopback addresses
    pub block_private_targets: bool,
    /// Number of history records kept and listed
    pub history_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let user_agent = env::var("USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Config {
            port,
            is_dev,
            public_base_url,
            user_agent,
            upstream_connect_timeout_secs: parse_or("UPSTREAM_CONNECT_TIMEOUT_SECS", 10),
            upstream_read_timeout_secs: parse_or("UPSTREAM_READ_TIMEOUT_SECS", 30),
            manifest_timeout_secs: parse_or("MANIFEST_TIMEOUT_SECS", 30),
            max_manifest_bytes: parse_or("MAX_MANIFEST_BYTES", DEFAULT_MAX_MANIFEST_BYTES),
            rewrite_tag_uris: parse_or("REWRITE_TAG_URIS", false),
            block_private_targets: parse_or("BLOCK_PRIVATE_TARGETS", false),
            history_limit: parse_or("HISTORY_LIMIT", 10),
        })
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    /// `None` when stalled origins may hold a connection indefinitely
    pub fn upstream_read_timeout(&self) -> Option<Duration> {
        (self.upstream_read_timeout_secs > 0)
            .then(|| Duration::from_secs(self.upstream_read_timeout_secs))
    }

    /// `None` when manifest fetches should not have a deadline
    pub fn manifest_timeout(&self) -> Option<Duration> {
        (self.manifest_timeout_secs > 0).then(|| Duration::from_secs(self.manifest_timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            is_dev: true,
            public_base_url: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            upstream_connect_timeout_secs: 10,
            upstream_read_timeout_secs: 30,
            manifest_timeout_secs: 30,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            rewrite_tag_uris: false,
            block_private_targets: false,
            history_limit: 10,
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset or unparsable
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
