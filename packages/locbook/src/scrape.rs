//! Page metadata scraping.
//!
//! Only `<title>`, `og:title` and `og:image` are consulted. html5ever recovers
//! from malformed markup, so parsing itself never fails.

use scraper::{Html, Selector};

use crate::links::{clean_page_title, is_content_image};

/// Metadata scraped from a place page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub og_title: Option<String>,
    /// Only set when the image looks like venue content
    pub og_image: Option<String>,
}

impl PageMeta {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let og_image = meta_property(&document, "og:image").filter(|url| is_content_image(url));

        Self {
            title: extract_title(&document),
            og_title: meta_property(&document, "og:title"),
            og_image,
        }
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|el| clean_page_title(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_page() {
        let html = r#"
            <html><head>
                <title>Test Cafe - Google Maps</title>
                <meta property="og:title" content="Test Cafe · 12 Nguyen Hue">
                <meta property="og:image" content="https://lh5.googleusercontent.com/p/AF1Qip=w900">
            </head><body></body></html>
        "#;

        let meta = PageMeta::parse(html);

        assert_eq!(meta.title.as_deref(), Some("Test Cafe"));
        assert_eq!(meta.og_title.as_deref(), Some("Test Cafe · 12 Nguyen Hue"));
        assert_eq!(
            meta.og_image.as_deref(),
            Some("https://lh5.googleusercontent.com/p/AF1Qip=w900")
        );
    }

    #[test]
    fn test_logo_og_image_rejected() {
        let html = r#"<meta property="og:image" content="https://maps.gstatic.com/google_maps_logo.png">"#;
        assert_eq!(PageMeta::parse(html).og_image, None);
    }

    #[test]
    fn test_missing_tags() {
        let meta = PageMeta::parse("<html><body><p>nothing here</p></body></html>");
        assert_eq!(meta, PageMeta::default());
    }

    #[test]
    fn test_malformed_html() {
        let html = "<title>Broken <b>Bar</title><meta property=og:title content='Broken Bar'";
        let meta = PageMeta::parse(html);
        assert!(meta.title.is_some());
        assert!(meta.og_image.is_none());
    }

    #[test]
    fn test_empty_content_skipped() {
        let html = r#"<meta property="og:title" content="  "><meta property="og:title" content="Second">"#;
        assert_eq!(PageMeta::parse(html).og_title.as_deref(), Some("Second"));
    }
}
