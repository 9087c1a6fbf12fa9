//! Map-link detection and URL-derived hints.

use regex::Regex;
use std::sync::LazyLock;

static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

/// Substrings that mark a link as a map link.
const MAP_LINK_MARKERS: &[&str] = &["google.com/maps", "goo.gl/maps", "maps.app.goo.gl"];

/// Hosts whose links must be expanded before they identify a place.
const SHORT_LINK_HOSTS: &[&str] = &["goo.gl", "maps.app.goo.gl", "g.co"];

/// og:image URLs containing these are branding or map tiles, not the venue.
const NON_CONTENT_IMAGE_MARKERS: &[&str] = &["google_maps_logo", "icon", "logo", "staticmap"];

const TITLE_SUFFIX: &str = " - Google Maps";

/// First http(s) URL in free text.
pub fn extract_url(text: &str) -> Option<String> {
    RE_URL.find(text).map(|m| m.as_str().to_string())
}

pub fn is_map_link(url: &str) -> bool {
    MAP_LINK_MARKERS.iter().any(|marker| url.contains(marker))
}

pub fn is_short_link(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .is_some_and(|host| SHORT_LINK_HOSTS.contains(&host)),
        Err(_) => false,
    }
}

/// Place name from a `/place/<name>/...` path segment.
///
/// Percent-escapes are decoded and `+` is read as a space.
pub fn name_from_url(url: &str) -> Option<String> {
    let segment = url.split("/place/").nth(1)?.split(['/', '?', '#']).next()?;
    let spaced = segment.replace('+', " ");
    let decoded = urlencoding::decode(&spaced)
        .map(|d| d.into_owned())
        .unwrap_or(spaced);
    let name = decoded.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Strip the map site's suffix from a page title.
pub fn clean_page_title(title: &str) -> String {
    title.replace(TITLE_SUFFIX, "").trim().to_string()
}

pub fn is_content_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    !NON_CONTENT_IMAGE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
