//! URL normalization and the cacheability policy.

use std::fmt;

use favcache_core::index::is_local_reference;

/// Error type for URL normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a URL string into the form used as a cache key.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Protocol-relative `//host/...` becomes `https://host/...`
/// 3. Default scheme to https:// if missing
/// 4. Lowercase the host
/// 5. Remove fragment (#...)
/// 6. Keep query string intact (do not reorder)
pub fn normalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if let Some(rest) = trimmed.strip_prefix("//") {
        format!("https://{rest}")
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Why a URL was not considered for caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to resolve.
    Empty,
    /// Already a `blob:` or `data:` reference.
    LocalReference,
    /// Served by an image proxy that refuses cross-origin retrieval.
    BlockedProxy(String),
    /// Not an http(s) URL.
    Invalid(UrlError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => f.write_str("empty url"),
            SkipReason::LocalReference => f.write_str("already a local reference"),
            SkipReason::BlockedProxy(host) => write!(f, "blocked image proxy: {host}"),
            SkipReason::Invalid(e) => write!(f, "{e}"),
        }
    }
}

/// Decides which URLs are cacheable and what key they are cached under.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    blocked_domains: Vec<String>,
}

impl UrlPolicy {
    /// Create a policy that refuses the given proxy domains (and their subdomains).
    pub fn new<I, S>(blocked_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked_domains = blocked_domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { blocked_domains }
    }

    /// True if `host` is one of the blocked domains or a subdomain of one.
    pub fn is_blocked_host(&self, host: &str) -> bool {
        self.blocked_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Cache key for `input`, or the reason it must not be cached.
    pub fn cache_key(&self, input: &str) -> Result<String, SkipReason> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SkipReason::Empty);
        }
        if is_local_reference(trimmed) {
            return Err(SkipReason::LocalReference);
        }

        let url = normalize(trimmed).map_err(SkipReason::Invalid)?;
        if let Some(host) = url.host_str()
            && self.is_blocked_host(host)
        {
            return Err(SkipReason::BlockedProxy(host.to_string()));
        }

        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> UrlPolicy {
        UrlPolicy::new(["images-ext-1.discordapp.net", "proxy.example.net"])
    }

    #[test]
    fn test_normalize_basic() {
        let url = normalize("https://cdn.example.com/a.gif").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_normalize_protocol_relative() {
        let url = normalize("//media.example.com/cat.gif").unwrap();
        assert_eq!(url.as_str(), "https://media.example.com/cat.gif");
    }

    #[test]
    fn test_normalize_default_scheme() {
        let url = normalize("cdn.example.com/a.gif").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.gif");
    }

    #[test]
    fn test_normalize_lowercase_host_and_drop_fragment() {
        let url = normalize("https://CDN.Example.COM/A.gif?w=200#frame").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/A.gif?w=200");
    }

    #[test]
    fn test_normalize_http_kept() {
        let url = normalize("http://cdn.example.com/a.gif").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_normalize_unsupported_scheme() {
        let result = normalize("ftp://cdn.example.com/a.gif");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(matches!(normalize(""), Err(UrlError::Empty)));
        assert!(matches!(normalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_cache_key_protocol_relative_matches_https() {
        let p = policy();
        assert_eq!(p.cache_key("//cdn.example.com/a.gif"), p.cache_key("https://cdn.example.com/a.gif"));
    }

    #[test]
    fn test_cache_key_rejects_empty_and_local() {
        let p = policy();
        assert_eq!(p.cache_key(""), Err(SkipReason::Empty));
        assert_eq!(p.cache_key("blob:favcache/0000000000000001"), Err(SkipReason::LocalReference));
        assert_eq!(p.cache_key("data:image/gif;base64,R0lGOD"), Err(SkipReason::LocalReference));
    }

    #[test]
    fn test_cache_key_rejects_blocked_proxy_and_subdomains() {
        let p = policy();
        assert_eq!(
            p.cache_key("https://images-ext-1.discordapp.net/external/abc/a.gif"),
            Err(SkipReason::BlockedProxy("images-ext-1.discordapp.net".into()))
        );
        assert!(matches!(
            p.cache_key("//eu.proxy.example.net/a.gif"),
            Err(SkipReason::BlockedProxy(_))
        ));
        assert!(p.cache_key("https://notproxy.example.net/a.gif").is_ok());
    }

    #[test]
    fn test_cache_key_rejects_non_http() {
        let p = policy();
        assert!(matches!(p.cache_key("file:///etc/passwd"), Err(SkipReason::Invalid(_))));
    }

    #[test]
    fn test_blocked_domains_are_normalized() {
        let p = UrlPolicy::new([" .Proxy.Example.NET ", ""]);
        assert!(p.is_blocked_host("proxy.example.net"));
        assert!(!p.is_blocked_host("example.net"));
    }
}
