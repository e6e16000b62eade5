use super::resolve::{ReferenceKind, ResolvedReference};

/// Route serving rewritten playlists
pub const MANIFEST_PATH: &str = "/api/proxy/manifest";
/// Route streaming segments verbatim
pub const SEGMENT_PATH: &str = "/api/proxy/segment";

/// Builds the URLs that route a resolved reference back through this proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyUrlBuilder {
    public_base_url: String,
}

impl ProxyUrlBuilder {
    /// `public_base_url` is prepended to the route; pass `""` for
    /// root-relative URLs, which players resolve against the proxy itself.
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Proxied URL for `reference`, carrying `referrer` (empty when absent)
    /// so nested fetches keep spoofing the same origin.
    ///
    /// Both values are percent-encoded with every byte outside
    /// `A-Z a-z 0-9 - . _ ~` escaped. That is stricter than a browser's
    /// `encodeURIComponent`, which leaves `! ' ( ) *` alone, so
    /// `seg(1).ts` is emitted as `seg%281%29.ts`. Decoding yields the
    /// original string either way.
    pub fn build(&self, reference: &ResolvedReference, referrer: Option<&str>) -> String {
        let route = match reference.kind {
            ReferenceKind::Playlist => MANIFEST_PATH,
            ReferenceKind::Segment => SEGMENT_PATH,
        };

        format!(
            "{}{}?url={}&referrer={}",
            self.public_base_url,
            route,
            urlencoding::encode(&reference.absolute_url),
            urlencoding::encode(referrer.unwrap_or_default()),
        )
    }
}
