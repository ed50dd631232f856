//! URL-shape predicate used to validate image sources and link targets.

use url::Url;

/// Signature of a URL-shape predicate supplied by the host
pub type UrlPredicate = fn(&str) -> bool;

/// Absolute http(s) URL with a host
pub fn looks_like_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_urls() {
        assert!(looks_like_url("https://example.com/a.png"));
        assert!(looks_like_url("http://localhost:3000/uploads/fig-1.jpg"));
    }

    #[test]
    fn test_rejects_non_urls() {
        assert!(!looks_like_url("not-a-url"));
        assert!(!looks_like_url(""));
        assert!(!looks_like_url("/relative/path.png"));
        assert!(!looks_like_url("ftp://example.com/file"));
        assert!(!looks_like_url("https://exa mple.com"));
    }
}
