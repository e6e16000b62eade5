//! Resolution of playlist URI lines against the playlist's own location.

use crate::error::{ProxyError, Result};
use url::Url;

/// What a resolved reference points at, which decides the proxy endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Another playlist (master -> media, media -> rendition, ...)
    Playlist,
    /// Anything else: media segments, init sections, keys
    Segment,
}

impl ReferenceKind {
    /// Classify by the `.m3u8` substring anywhere in the absolute URL.
    ///
    /// A segment whose query string happens to contain `.m3u8` is classified
    /// as a playlist; this matches the behavior players were built against.
    pub fn classify(absolute_url: &str) -> Self {
        if absolute_url.contains(".m3u8") {
            ReferenceKind::Playlist
        } else {
            ReferenceKind::Segment
        }
    }
}

/// A playlist reference after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub absolute_url: String,
    pub kind: ReferenceKind,
}

/// Directory component of a playlist URL.
///
/// `http://host/a/b/index.m3u8?token=1` becomes `http://host/a/b/`; query and
/// fragment of the playlist URL never leak into resolved references.
pub fn base_path(base_url: &str) -> Result<Url> {
    let malformed = |source| ProxyError::MalformedUrl {
        input: base_url.to_string(),
        source,
    };

    Url::parse(base_url.trim())
        .and_then(|url| url.join("./"))
        .map_err(malformed)
}

/// Resolve one URI line from a playlist against `base_path`.
///
/// Lines that already carry an `http://` or `https://` scheme are taken
/// verbatim (trimmed). Everything else goes through RFC 3986 reference
/// resolution, so `../`, root-relative, protocol-relative and query-only
/// references all compose with the base.
pub fn resolve(line: &str, base_path: &Url) -> Result<ResolvedReference> {
    let trimmed = line.trim();

    let absolute_url = if is_absolute_http(trimmed) {
        trimmed.to_string()
    } else {
        base_path
            .join(trimmed)
            .map_err(|source| ProxyError::MalformedUrl {
                input: line.to_string(),
                source,
            })?
            .into()
    };

    let kind = ReferenceKind::classify(&absolute_url);
    Ok(ResolvedReference { absolute_url, kind })
}

fn is_absolute_http(line: &str) -> bool {
    line.starts_with("http://") || line.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        base_path(url).unwrap()
    }

    #[test]
    fn base_path_is_directory_of_playlist() {
        assert_eq!(
            base("http://host/a/b/playlist.m3u8").as_str(),
            "http://host/a/b/"
        );
    }

    #[test]
    fn base_path_drops_query_and_fragment() {
        assert_eq!(
            base("https://cdn.example.com/live/index.m3u8?token=a/b#frag").as_str(),
            "https://cdn.example.com/live/"
        );
    }

    #[test]
    fn base_path_of_directory_url_is_itself() {
        assert_eq!(base("http://host/a/").as_str(), "http://host/a/");
    }

    #[test]
    fn base_path_rejects_relative_input() {
        let err = base_path("live/index.m3u8").unwrap_err();
        assert!(matches!(
            err,
            ProxyError::MalformedUrl { ref input, .. } if input == "live/index.m3u8"
        ));
    }

    #[test]
    fn base_path_rejects_garbage() {
        assert!(base_path("").is_err());
        assert!(base_path("http://[::1").is_err());
    }

    #[test]
    fn absolute_line_bypasses_resolution() {
        let resolved =
            resolve("http://foo/bar.ts", &base("https://other.example/x/y.m3u8")).unwrap();
        assert_eq!(
            resolved,
            ResolvedReference {
                absolute_url: "http://foo/bar.ts".to_string(),
                kind: ReferenceKind::Segment,
            }
        );
    }

    #[test]
    fn absolute_line_is_trimmed_but_not_normalized() {
        // Url parsing would rewrite this to "http://foo/a/c.ts"; verbatim keeps it.
        let resolved = resolve("  http://foo/a/../c.ts \r", &base("http://host/")).unwrap();
        assert_eq!(resolved.absolute_url, "http://foo/a/../c.ts");
    }

    #[test]
    fn relative_segment_resolves_against_directory() {
        let b = base("http://host/a/b/playlist.m3u8");
        assert_eq!(resolve("seg1.ts", &b).unwrap().absolute_url, "http://host/a/b/seg1.ts");
    }

    #[test]
    fn parent_segments_resolve() {
        let b = base("http://host/a/b/playlist.m3u8");
        assert_eq!(
            resolve("../c/seg2.ts", &b).unwrap().absolute_url,
            "http://host/a/c/seg2.ts"
        );
    }

    #[test]
    fn root_relative_and_protocol_relative_resolve() {
        let b = base("https://host/a/b/playlist.m3u8");
        assert_eq!(resolve("/root.ts", &b).unwrap().absolute_url, "https://host/root.ts");
        assert_eq!(
            resolve("//cdn.example/x.ts", &b).unwrap().absolute_url,
            "https://cdn.example/x.ts"
        );
    }

    #[test]
    fn relative_query_strings_are_kept() {
        let b = base("http://host/live/index.m3u8?session=1");
        assert_eq!(
            resolve("seg.ts?sig=abc&exp=9", &b).unwrap().absolute_url,
            "http://host/live/seg.ts?sig=abc&exp=9"
        );
    }

    #[test]
    fn nested_playlist_classified_as_playlist() {
        let b = base("http://host/master.m3u8");
        let resolved = resolve("sub/index.m3u8", &b).unwrap();
        assert_eq!(resolved.absolute_url, "http://host/sub/index.m3u8");
        assert_eq!(resolved.kind, ReferenceKind::Playlist);
    }

    #[test]
    fn fragmented_mp4_chunk_classified_as_segment() {
        let b = base("http://host/master.m3u8");
        assert_eq!(resolve("chunk.m4s", &b).unwrap().kind, ReferenceKind::Segment);
    }

    #[test]
    fn classification_is_substring_based() {
        assert_eq!(
            ReferenceKind::classify("http://host/seg.ts?from=index.m3u8"),
            ReferenceKind::Playlist
        );
        assert_eq!(
            ReferenceKind::classify("http://host/index.m3u8.bak"),
            ReferenceKind::Playlist
        );
        assert_eq!(ReferenceKind::classify("http://host/key.bin"), ReferenceKind::Segment);
    }

    #[test]
    fn unresolvable_line_is_an_error_carrying_the_line() {
        let b = base("http://host/a/index.m3u8");
        // Starts with an http scheme, so taken verbatim rather than parsed.
        assert!(resolve("http://[bad", &b).is_ok());

        let err = resolve("ftp://[::1", &b).unwrap_err();
        match err {
            ProxyError::MalformedUrl { input, .. } => assert_eq!(input, "ftp://[::1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
