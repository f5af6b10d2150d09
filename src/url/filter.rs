//! Static deny-list applied before a URL is admitted to the frontier

use url::Url;

/// File extensions that never lead to an HTML page
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "css", "js",
    "mjs", "map", "json", "xml", "rss", "atom", "txt", "csv", "zip", "rar", "7z", "gz", "tgz",
    "tar", "bz2", "mp3", "mp4", "m4a", "wav", "ogg", "avi", "mov", "webm", "mkv", "woff",
    "woff2", "ttf", "otf", "eot", "exe", "dmg", "msi", "apk", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx", "odt",
];

/// Path segments for admin, authentication and cart areas
const DENIED_SEGMENTS: &[&str] = &[
    "admin",
    "administrator",
    "wp-admin",
    "wp-login.php",
    "login",
    "logout",
    "signin",
    "sign-in",
    "signup",
    "register",
    "cart",
    "basket",
    "checkout",
    "account",
    "my-account",
];

/// Returns the reason a URL is on the static deny-list, if it is
pub fn deny_reason(url: &Url) -> Option<&'static str> {
    let path = url.path().to_lowercase();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if DENIED_SEGMENTS.contains(&segment) {
            return Some("restricted path");
        }
    }

    let last = path.rsplit('/').next().unwrap_or_default();
    if let Some((_, extension)) = last.rsplit_once('.') {
        if BINARY_EXTENSIONS.contains(&extension) {
            return Some("binary extension");
        }
    }

    None
}

/// Checks whether a URL passes the static deny-list
pub fn is_crawlable(url: &Url) -> bool {
    deny_reason(url).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_allows_regular_pages() {
        assert!(is_crawlable(&url("https://example.com/")));
        assert!(is_crawlable(&url("https://example.com/blog/my-post")));
        assert!(is_crawlable(&url("https://example.com/page.html")));
        assert!(is_crawlable(&url("https://example.com/about.php?x=1")));
    }

    #[test]
    fn test_denies_binary_extensions() {
        assert_eq!(
            deny_reason(&url("https://example.com/files/report.PDF")),
            Some("binary extension")
        );
        assert!(!is_crawlable(&url("https://example.com/img/logo.png")));
        assert!(!is_crawlable(&url("https://example.com/static/app.js")));
    }

    #[test]
    fn test_denies_admin_and_cart_paths() {
        assert_eq!(
            deny_reason(&url("https://example.com/admin/panel")),
            Some("restricted path")
        );
        assert!(!is_crawlable(&url("https://example.com/wp-admin")));
        assert!(!is_crawlable(&url("https://example.com/cart")));
        assert!(!is_crawlable(&url("https://example.com/shop/checkout")));
        assert!(!is_crawlable(&url("https://example.com/Login")));
    }

    #[test]
    fn test_segment_match_is_exact() {
        assert!(is_crawlable(&url("https://example.com/administration-guide")));
        assert!(is_crawlable(&url("https://example.com/carts-and-wagons")));
    }
}
