//! Target URL normalization.
//!
//! A [`ScanTarget`] is the canonical form of a caller supplied URL: scheme
//! defaulted to `https`, trailing slashes stripped, host extracted as the
//! domain and the path kept for root detection.

use crate::error::PagewatchError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// A normalized scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    page_url: String,
    origin: String,
    domain: String,
    pathname: String,
}

impl ScanTarget {
    /// Normalize `raw` into a scan target.
    ///
    /// # Errors
    /// Returns [`PagewatchError::InvalidTarget`] if the URL cannot be parsed
    /// or has no host to derive a domain from.
    pub fn parse(raw: &str) -> Result<Self, PagewatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PagewatchError::InvalidTarget("empty url".to_string()));
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| PagewatchError::InvalidTarget(format!("'{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PagewatchError::InvalidTarget(format!(
                "'{raw}': unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let domain = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(PagewatchError::InvalidTarget(format!("no host in '{raw}'"))),
        };

        let path = url.path().trim_end_matches('/');
        let pathname = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };

        let page_url = url.as_str().trim_end_matches('/').to_string();
        let origin = url.origin().ascii_serialization();

        Ok(Self {
            page_url,
            origin,
            domain,
            pathname,
        })
    }

    /// Normalized page URL without trailing slash.
    #[must_use]
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Scheme, host and port, e.g. `https://example.com`.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Host of the target.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Path component, `/` for the domain root.
    #[must_use]
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// True when the target is the domain root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.pathname == "/"
    }

    /// True for loopback targets, which are only scannable in development.
    #[must_use]
    pub fn is_localhost(&self) -> bool {
        static LOCAL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = LOCAL_REGEX.get_or_init(|| {
            Regex::new(r"^(localhost|.+\.localhost|127(\.\d{1,3}){3}|0\.0\.0\.0|\[::1\])$")
                .expect("valid regex")
        });
        regex.is_match(&self.domain)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.page_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let target = ScanTarget::parse("https://example.com/").expect("parse root");
        assert_eq!(target.page_url(), "https://example.com");
        assert_eq!(target.domain(), "example.com");
        assert_eq!(target.pathname(), "/");
        assert!(target.is_root());
    }

    #[test]
    fn test_parse_defaults_scheme() {
        let target = ScanTarget::parse("example.com/about/").expect("parse without scheme");
        assert_eq!(target.page_url(), "https://example.com/about");
        assert_eq!(target.origin(), "https://example.com");
        assert_eq!(target.pathname(), "/about");
        assert!(!target.is_root());
    }

    #[test]
    fn test_parse_keeps_http() {
        let target = ScanTarget::parse("http://blog.example.com/post/1").expect("parse http");
        assert_eq!(target.page_url(), "http://blog.example.com/post/1");
        assert_eq!(target.domain(), "blog.example.com");
    }

    #[test]
    fn test_parse_invalid() {
        let invalid = vec!["", "   ", "https://", "ftp://example.com", "http://exa mple.com"];
        for raw in invalid {
            assert!(
                matches!(ScanTarget::parse(raw), Err(PagewatchError::InvalidTarget(_))),
                "Should fail for: {raw}"
            );
        }
    }

    #[test]
    fn test_localhost_detection() {
        let local = vec![
            "http://localhost:3000",
            "http://127.0.0.1",
            "http://app.localhost",
            "http://[::1]:8080",
        ];
        for raw in local {
            let target = ScanTarget::parse(raw).expect("parse local target");
            assert!(target.is_localhost(), "Should be local: {raw}");
        }

        let target = ScanTarget::parse("https://localhost.example.com").expect("parse remote");
        assert!(!target.is_localhost());
    }
}
