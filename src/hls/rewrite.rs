//! Line-oriented playlist rewriting.
//!
//! The rewriter never parses the playlist into a structured model: tags it
//! does not understand, vendor extensions and odd whitespace all survive
//! byte-for-byte, and only URI lines change. This keeps the output aligned
//! line-for-line with the origin's playlist, which HLS depends on.

use super::proxy_url::ProxyUrlBuilder;
use super::resolve::{self, ResolvedReference};
use crate::error::Result;
use std::borrow::Cow;
use std::fmt;
use tracing::debug;
use url::Url;

const URI_ATTRIBUTE: &str = "URI=\"";

/// One line of playlist text, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistLine<'a> {
    /// Empty or whitespace-only
    Blank(&'a str),
    /// Starts with `#`: tags and comments
    Directive(&'a str),
    /// Anything else: a reference to a nested playlist or segment
    UriReference(&'a str),
}

impl<'a> PlaylistLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() {
            PlaylistLine::Blank(line)
        } else if line.starts_with('#') {
            PlaylistLine::Directive(line)
        } else {
            PlaylistLine::UriReference(line)
        }
    }
}

/// Rewritten playlist, one entry per input line in input order.
///
/// Untouched lines borrow from the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenPlaylist<'a> {
    lines: Vec<Cow<'a, str>>,
}

impl RewrittenPlaylist<'_> {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| &**line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for RewrittenPlaylist<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Rewrites playlist URIs so they point back at the proxy.
#[derive(Debug, Clone, Default)]
pub struct ManifestRewriter {
    builder: ProxyUrlBuilder,
    rewrite_tag_uris: bool,
}

impl ManifestRewriter {
    /// With `rewrite_tag_uris` set, quoted `URI="..."` attributes on tag
    /// lines (keys, init maps, alternate renditions, LL-HLS parts) are
    /// proxied as well. Otherwise tag lines pass through untouched.
    pub fn new(builder: ProxyUrlBuilder, rewrite_tag_uris: bool) -> Self {
        Self {
            builder,
            rewrite_tag_uris,
        }
    }

    /// Rewrite `raw`, a playlist fetched from `base_url`.
    ///
    /// Splits on `\n` only, so a trailing newline produces a final empty
    /// line and joining the result with `\n` restores the original layout.
    ///
    /// # Errors
    /// [`ProxyError::MalformedUrl`](crate::error::ProxyError::MalformedUrl)
    /// when `base_url` or any URI line cannot be resolved. A single bad line
    /// fails the whole playlist rather than being dropped.
    pub fn rewrite<'a>(
        &self,
        raw: &'a str,
        base_url: &str,
        referrer: Option<&str>,
    ) -> Result<RewrittenPlaylist<'a>> {
        let base = resolve::base_path(base_url)?;

        let lines = raw
            .split('\n')
            .map(|line| self.rewrite_line(line, &base, referrer))
            .collect::<Result<Vec<_>>>()?;

        debug!("Rewrote {} playlist lines from {}", lines.len(), base_url);

        Ok(RewrittenPlaylist { lines })
    }

    fn rewrite_line<'a>(
        &self,
        line: &'a str,
        base: &Url,
        referrer: Option<&str>,
    ) -> Result<Cow<'a, str>> {
        match PlaylistLine::classify(line) {
            PlaylistLine::Blank(line) => Ok(Cow::Borrowed(line)),
            PlaylistLine::Directive(line) if self.rewrite_tag_uris => {
                self.rewrite_tag_line(line, base, referrer)
            }
            PlaylistLine::Directive(line) => Ok(Cow::Borrowed(line)),
            PlaylistLine::UriReference(line) => {
                let reference = resolve::resolve(line, base)?;
                Ok(Cow::Owned(self.proxied(&reference, referrer)))
            }
        }
    }

    /// Replace every non-empty quoted `URI="..."` value in a tag line.
    fn rewrite_tag_line<'a>(
        &self,
        line: &'a str,
        base: &Url,
        referrer: Option<&str>,
    ) -> Result<Cow<'a, str>> {
        let mut output = String::new();
        let mut cursor = 0;
        let mut changed = false;

        while let Some((value_start, value_end)) = find_quoted_uri(line, cursor) {
            output.push_str(&line[cursor..value_start]);

            let value = &line[value_start..value_end];
            if !value.is_empty() {
                let reference = resolve::resolve(value, base)?;
                output.push_str(&self.proxied(&reference, referrer));
                changed = true;
            }
            cursor = value_end;
        }

        if !changed {
            return Ok(Cow::Borrowed(line));
        }
        output.push_str(&line[cursor..]);
        Ok(Cow::Owned(output))
    }

    fn proxied(&self, reference: &ResolvedReference, referrer: Option<&str>) -> String {
        let proxied = self.builder.build(reference, referrer);
        debug!("{} -> {}", reference.absolute_url, proxied);
        proxied
    }
}

/// Byte range of the next quoted `URI` attribute value at or after `from`.
///
/// Returns the offsets of the value itself, excluding the quotes. An
/// unterminated value yields `None`.
fn find_quoted_uri(line: &str, from: usize) -> Option<(usize, usize)> {
    let marker = line[from..].find(URI_ATTRIBUTE)? + from;
    let value_start = marker + URI_ATTRIBUTE.len();
    let closing_quote = line[value_start..].find('"')?;
    Some((value_start, value_start + closing_quote))
}
