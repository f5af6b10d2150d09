use crate::config::UrlConfig;
use crate::UrlError;
use serde::{Serialize, Serializer};
use std::fmt;
use url::form_urlencoded;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "dclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "yclid",
];

/// A URL in canonical form
///
/// Two URLs that are equivalent under the normalization policy hold the same
/// string, and normalizing an already normalized URL is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Lower-cased host of the URL
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalization policy shared by every component of a crawl
///
/// The default policy keeps the host as given (lower-cased). `www.` and bare
/// hosts are still treated as one site by [`crate::url::same_site`].
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    /// Store `www.host` URLs under the bare host
    pub strip_www: bool,

    /// Tracking parameters removed in addition to [`TRACKING_PARAMS`]
    pub extra_tracking_params: Vec<String>,
}

impl UrlPolicy {
    pub fn from_config(config: &UrlConfig) -> Self {
        Self {
            strip_www: config.strip_www,
            extra_tracking_params: config
                .tracking_params
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Normalizes a URL according to Sumi-Audit's normalization rules
    ///
    /// # Normalization Steps
    ///
    /// 1. Resolve relative, root-relative and protocol-relative forms against `base`
    /// 2. Reject anything that is not HTTP(S)
    /// 3. Lowercase the host (and drop `www.` if the policy says so)
    /// 4. Normalize path:
    ///    - Remove dot segments and repeated slashes
    ///    - Remove trailing slash (except for root /)
    /// 5. Remove fragment (everything after #)
    /// 6. Remove tracking query parameters
    /// 7. Sort remaining query parameters by key, then value
    /// 8. Remove empty query string (trailing ?)
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_audit::url::UrlPolicy;
    ///
    /// let policy = UrlPolicy::default();
    /// let url = policy.normalize("HTTP://Example.COM/page/?b=2&a=1#top", None).unwrap();
    /// assert_eq!(url.as_str(), "http://example.com/page?a=1&b=2");
    /// ```
    pub fn normalize(&self, raw: &str, base: Option<&Url>) -> Result<NormalizedUrl, UrlError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UrlError::Parse("empty URL".to_string()));
        }

        // Step 1: Parse, resolving against the base when one is given
        let mut url = match base {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        }
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

        // Step 2: Validate scheme
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        // Step 3: Lowercase the host
        let host = url.host_str().ok_or(UrlError::MissingDomain)?;
        if host.is_empty() {
            return Err(UrlError::MissingDomain);
        }
        let mut normalized_host = host.to_lowercase();
        if self.strip_www {
            if let Some(bare) = normalized_host.strip_prefix("www.") {
                normalized_host = bare.to_string();
            }
        }
        if normalized_host != host {
            url.set_host(Some(&normalized_host))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }

        // Step 4: Normalize path
        let normalized_path = normalize_path(url.path());
        url.set_path(&normalized_path);

        // Step 5: Remove fragment
        url.set_fragment(None);

        // Step 6-8: Filter and sort query parameters
        if url.query().is_some() {
            let params = self.filter_and_sort_query_params(&url);

            if params.is_empty() {
                url.set_query(None);
            } else {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                url.set_query(Some(&query));
            }
        }

        Ok(NormalizedUrl(url))
    }

    /// Filters out tracking parameters and sorts remaining query parameters
    fn filter_and_sort_query_params(&self, url: &Url) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !self.is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        params.sort();
        params
    }

    /// Checks if a query parameter is a tracking parameter
    fn is_tracking_param(&self, key: &str) -> bool {
        let key = key.to_lowercase();

        if key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str()) {
            return true;
        }

        self.extra_tracking_params.iter().any(|p| *p == key)
    }
}

/// Normalizes a URL with the default policy
///
/// # Examples
///
/// ```
/// use sumi_audit::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/docs/", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<NormalizedUrl, UrlError> {
    UrlPolicy::default().normalize(raw, base)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        normalize_url(raw, None).unwrap().into_string()
    }

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_keeps_scheme() {
        assert_eq!(normalize("http://example.com/page"), "http://example.com/page");
    }

    #[test]
    fn test_keeps_www_by_default() {
        assert_eq!(normalize("https://www.example.com/"), "https://www.example.com/");
    }

    #[test]
    fn test_strip_www_policy() {
        let policy = UrlPolicy {
            strip_www: true,
            ..UrlPolicy::default()
        };
        let url = policy.normalize("https://WWW.example.com/a", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(normalize("https://example.com/page/"), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(normalize("https://example.com/"), "https://example.com/");
        assert_eq!(normalize("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(
            normalize("https://example.com/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_remove_tracking_params() {
        assert_eq!(
            normalize("https://example.com/page?utm_source=twitter&gclid=1&fbclid=2"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_keeps_functional_params() {
        assert_eq!(
            normalize("https://example.com/search?q=shoes&utm_medium=email&page=2"),
            "https://example.com/search?page=2&q=shoes"
        );
    }

    #[test]
    fn test_extra_tracking_params() {
        let policy = UrlPolicy {
            extra_tracking_params: vec!["ref".to_string()],
            ..UrlPolicy::default()
        };
        let url = policy
            .normalize("https://example.com/p?ref=home&id=3", None)
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/p?id=3");
    }

    #[test]
    fn test_sort_query_params() {
        assert_eq!(
            normalize("https://example.com/page?b=2&a=1"),
            "https://example.com/page?a=1&b=2"
        );
    }

    #[test]
    fn test_query_order_insensitive_with_repeated_keys() {
        assert_eq!(
            normalize("https://example.com/p?tag=b&x=1&tag=a"),
            normalize("https://example.com/p?tag=a&tag=b&x=1")
        );
    }

    #[test]
    fn test_normalize_path_with_dots() {
        assert_eq!(normalize("https://example.com/a/../b/./c"), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_domain_keeps_path_case() {
        assert_eq!(normalize("https://EXAMPLE.COM/Page"), "https://example.com/Page");
    }

    #[test]
    fn test_multiple_slashes() {
        assert_eq!(
            normalize("https://example.com///path//to///page"),
            "https://example.com/path/to/page"
        );
    }

    #[test]
    fn test_resolve_relative_forms() {
        let base = base();
        let relative = normalize_url("other", Some(&base)).unwrap();
        assert_eq!(relative.as_str(), "https://example.com/blog/other");

        let root = normalize_url("/about/", Some(&base)).unwrap();
        assert_eq!(root.as_str(), "https://example.com/about");

        let protocol = normalize_url("//cdn.example.org/x", Some(&base)).unwrap();
        assert_eq!(protocol.as_str(), "https://cdn.example.org/x");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page", None);
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));

        let result = normalize_url("mailto:someone@example.com", Some(&base()));
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url", None).is_err());
        assert!(normalize_url("   ", None).is_err());
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "HTTP://WWW.Example.com:80/a/b/../c/?z=1&utm_source=x&a=hello world#frag",
            "https://example.com/p?x=1%262&y=%20",
            "https://example.com/?flag",
            "https://example.com/%7Euser/",
        ];

        for input in inputs {
            let once = normalize_url(input, None).unwrap();
            let twice = normalize_url(once.as_str(), None).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_serializes_as_string() {
        let url = normalize_url("https://example.com/a", None).unwrap();
        assert_eq!(
            serde_json::to_string(&url).unwrap(),
            "\"https://example.com/a\""
        );
    }
}
