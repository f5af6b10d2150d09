use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips a leading `www.` label
pub fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Checks whether two hosts belong to the same logical site
///
/// `www.example.com` and `example.com` are the same site; other subdomains
/// are not.
///
/// # Examples
///
/// ```
/// use sumi_audit::url::same_site;
///
/// assert!(same_site("www.example.com", "example.com"));
/// assert!(!same_site("blog.example.com", "example.com"));
/// ```
pub fn same_site(a: &str, b: &str) -> bool {
    bare_host(&a.to_lowercase()) == bare_host(&b.to_lowercase())
}

/// Returns the distinguishing label of a host (`example` for `www.example.com`)
pub fn domain_token(host: &str) -> String {
    bare_host(&host.to_lowercase())
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_same_site_ignores_www() {
        assert!(same_site("www.example.com", "example.com"));
        assert!(same_site("example.com", "WWW.EXAMPLE.COM"));
        assert!(same_site("example.com", "example.com"));
    }

    #[test]
    fn test_same_site_rejects_other_hosts() {
        assert!(!same_site("example.org", "example.com"));
        assert!(!same_site("shop.example.com", "example.com"));
        assert!(!same_site("wwwexample.com", "example.com"));
    }

    #[test]
    fn test_domain_token() {
        assert_eq!(domain_token("www.example.com"), "example");
        assert_eq!(domain_token("Acme.co.uk"), "acme");
        assert_eq!(domain_token("127.0.0.1"), "127");
    }
}
