use crate::UrlError;
use url::Url;

/// Schemes that never point at a probe-able resource
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a discovered link into an absolute, comparable URL
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty links, fragment-only links and
///    `javascript:`, `mailto:`, `tel:`, `data:` links
/// 2. Resolve relative links against the page URL
/// 3. Require an HTTP or HTTPS scheme and a host
/// 4. Lowercase the host and drop default ports (done by `url`)
/// 5. Remove dot segments from the path (done by `url`)
/// 6. Remove the fragment
/// 7. Remove an empty query string (trailing `?`)
///
/// Unlike crawl-frontier normalization the path, the `www.` prefix and the
/// query parameters are kept: the normalized URL is what gets probed.
///
/// # Examples
///
/// ```
/// use page_audit::url::normalize_link;
/// use url::Url;
///
/// let base = Url::parse("https://Example.com/listing/").unwrap();
/// let url = normalize_link("../about?#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize_link(href: &str, base: &Url) -> Result<Url, UrlError> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Parse("empty link".to_string()));
    }

    if href.starts_with('#') {
        return Err(UrlError::Parse(format!("fragment-only link '{}'", href)));
    }

    let lowered = href.to_ascii_lowercase();
    if let Some(scheme) = SKIPPED_SCHEMES.iter().find(|s| lowered.starts_with(**s)) {
        return Err(UrlError::InvalidScheme(scheme.trim_end_matches(':').to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Parses an absolute page URL
pub fn parse_page_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
