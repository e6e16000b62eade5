//! HLS playlist rewriting: URI resolution, proxy URL construction and the
//! line-oriented rewriter built on top of them.

pub mod proxy_url;
pub mod resolve;
pub mod rewrite;

pub use proxy_url::{MANIFEST_PATH, ProxyUrlBuilder, SEGMENT_PATH};
pub use resolve::{ReferenceKind, ResolvedReference};
pub use rewrite::{ManifestRewriter, PlaylistLine, RewrittenPlaylist};
