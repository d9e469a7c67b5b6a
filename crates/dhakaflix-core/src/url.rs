//! URL helper functions for DhakaFlix mirrors
//!
//! Provides endpoint building, title extraction from hrefs, link
//! resolution for the crawler, and the text-level URL clean-up the
//! mirrors' sloppy listings require.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static IP_HTTP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\s*http").expect("static pattern")
});
static DOUBLE_PROTOCOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http(s)?://http(s)?://").expect("static pattern"));
static MULTI_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:/])/{2,}").expect("static pattern"));

/// Repairs the malformed addresses mirrors put in their listings
///
/// Keeps only the last `http(s)://` occurrence, unglues an IP address from
/// a following `http`, collapses doubled protocols and duplicate slashes
/// (never the `//` after a scheme), and escapes spaces and ampersands.
///
/// # Example
/// ```
/// use dhakaflix_core::url::sanitize_url;
/// let url = sanitize_url("http://172.16.50.7//DHAKA-FLIX-7/A & B/");
/// assert_eq!(url, "http://172.16.50.7/DHAKA-FLIX-7/A%20%26%20B/");
/// ```
pub fn sanitize_url(raw: &str) -> String {
    if raw.trim().is_empty() {
        return raw.to_string();
    }

    let mut url = raw.trim().to_string();
    let lower = url.to_ascii_lowercase();
    let last_protocol = lower
        .rfind("http://")
        .into_iter()
        .chain(lower.rfind("https://"))
        .max();
    if let Some(index) = last_protocol
        && index > 0
    {
        url = url[index..].to_string();
    }

    let url = IP_HTTP.replace_all(&url, "$1/http");
    let url = DOUBLE_PROTOCOL.replace_all(&url, "http${1}://");
    let url = url.replace(":://://", "://");
    let url = MULTI_SLASH.replace_all(&url, "${1}/");

    url.replace(' ', "%20").replace('&', "%26")
}

/// Builds the search RPC endpoint for a share
///
/// # Example
/// ```
/// use dhakaflix_core::url::search_endpoint;
/// let url = search_endpoint("http://172.16.50.9", "DHAKA-FLIX-9");
/// assert_eq!(url, "http://172.16.50.9/DHAKA-FLIX-9/");
/// ```
pub fn search_endpoint(base_url: &str, server_id: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), server_id.trim_matches('/'))
}

/// Extracts a display title from an href
///
/// Takes the last non-empty path segment and percent-decodes it, keeping
/// the raw segment when decoding fails.
///
/// # Example
/// ```
/// use dhakaflix_core::url::title_from_href;
/// assert_eq!(title_from_href("/DHAKA-FLIX-9/Naruto%20(2002)/"), "Naruto (2002)");
/// ```
pub fn title_from_href(href: &str) -> String {
    let normalized = href.replace('\\', "/");
    let segment = normalized
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => segment.trim().to_string(),
    }
}

/// Scheme, host and port of an address, without a trailing slash
pub fn host_root(address: &str) -> Option<String> {
    let url = Url::parse(address).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Resolves a listing href against the directory it appeared in
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// Whether `candidate` lies strictly inside the directory `root`
///
/// Same origin, and the candidate path extends the root path. The root
/// itself is not inside itself.
pub fn is_within(root: &Url, candidate: &Url) -> bool {
    if root.scheme() != candidate.scheme()
        || root.host_str() != candidate.host_str()
        || root.port_or_known_default() != candidate.port_or_known_default()
    {
        return false;
    }

    let root_path = root.path();
    let root_dir = if root_path.ends_with('/') {
        root_path.to_string()
    } else {
        format!("{}/", root_path)
    };

    candidate.path().starts_with(&root_dir) && candidate.path().len() > root_dir.len()
}

/// Folder-art address for a folder location, `None` for files
pub fn folder_thumbnail(location: &str, file: &str) -> Option<String> {
    location
        .ends_with('/')
        .then(|| sanitize_url(&format!("{}{}", location, file)))
}
