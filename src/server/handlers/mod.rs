pub mod health;
pub mod history;
pub mod manifest;
pub mod segment;

use crate::error::{ProxyError, Result};
use serde::Deserialize;

/// Raw query string of both proxy endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
    pub referrer: Option<String>,
}

/// What a single proxy request should fetch, and on whose behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    target_url: String,
    referrer: Option<String>,
}

impl ProxyTarget {
    /// Build a target from query parameters.
    ///
    /// # Errors
    /// [`ProxyError::MissingParameter`] when `url` is absent or blank.
    pub fn from_params(params: ProxyParams) -> Result<Self> {
        let target_url = params
            .url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ProxyError::MissingParameter("url"))?;

        Ok(Self {
            target_url,
            referrer: params.referrer.filter(|r| !r.is_empty()),
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: Option<&str>, referrer: Option<&str>) -> ProxyParams {
        ProxyParams {
            url: url.map(str::to_string),
            referrer: referrer.map(str::to_string),
        }
    }

    #[test]
    fn missing_url_rejected() {
        let err = ProxyTarget::from_params(params(None, Some("r"))).unwrap_err();
        assert!(matches!(err, ProxyError::MissingParameter("url")));
    }

    #[test]
    fn blank_url_rejected() {
        assert!(ProxyTarget::from_params(params(Some("  "), None)).is_err());
    }

    #[test]
    fn empty_referrer_is_absent() {
        let target = ProxyTarget::from_params(params(Some("http://o/a.m3u8"), Some(""))).unwrap();
        assert_eq!(target.referrer(), None);
    }

    #[test]
    fn values_are_kept() {
        let query = params(Some(" http://o/a.m3u8 "), Some("http://site"));
        let target = ProxyTarget::from_params(query).unwrap();
        assert_eq!(target.target_url(), "http://o/a.m3u8");
        assert_eq!(target.referrer(), Some("http://site"));
    }
}
