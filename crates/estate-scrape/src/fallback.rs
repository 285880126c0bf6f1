//! Best-effort extraction from HTML meta tags.
//!
//! Used whenever the page-state JSON is missing or unusable. Only Open Graph
//! tags and inline images are consulted, so this path keeps working when the
//! page-state layout changes.

use std::sync::LazyLock;

use estate_models::ListingRecord;
use regex::Regex;
use scraper::{Html, Selector};

use crate::extract::{ExtractedListing, ExtractionSource};

/// CDN hosts serving listing photos.
pub const PHOTO_CDN_HOSTS: [&str; 2] = ["apollo.olxcdn.com", "img.otodom.pl"];

static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"], meta[name="og:title"]"#).expect("valid selector")
});

static OG_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:description"], meta[name="og:description"]"#)
        .expect("valid selector")
});

static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"], meta[name="og:image"]"#).expect("valid selector")
});

static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));

/// Digits (optionally space-separated) followed by a currency marker.
static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d[\d\s]*(?:pln|zł|zl)").expect("valid regex"));

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

/// First price-looking fragment of a description, trimmed.
pub fn find_price(description: &str) -> Option<String> {
    PRICE
        .find(description)
        .map(|m| m.as_str().trim().to_string())
}

/// Extract a listing from meta tags and inline images.
pub fn extract_from_meta(doc: &Html) -> ExtractedListing {
    let title = meta_content(doc, &OG_TITLE).unwrap_or_default();
    let price = meta_content(doc, &OG_DESCRIPTION)
        .and_then(|d| find_price(&d))
        .unwrap_or_default();

    let mut photo_urls: Vec<String> = Vec::new();
    let mut push_unique = |url: &str| {
        if !photo_urls.iter().any(|u| u == url) {
            photo_urls.push(url.to_string());
        }
    };

    if let Some(image) = meta_content(doc, &OG_IMAGE) {
        push_unique(&image);
    }

    for src in doc.select(&IMG).filter_map(|el| el.value().attr("src")) {
        if PHOTO_CDN_HOSTS.iter().any(|host| src.contains(host)) {
            push_unique(src);
        }
    }

    ExtractedListing {
        listing: ListingRecord {
            title,
            price,
            ..Default::default()
        },
        photo_urls,
        source: ExtractionSource::MetaTags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
            <meta property="og:title" content=" Dom z ogrodem " />
            <meta property="og:description" content="Dom 140 m2, cena 1 250 000 zł, do negocjacji. Czynsz 500 PLN" />
            <meta property="og:image" content="https://ireland.apollo.olxcdn.com/v1/files/a/image" />
        </head><body>
            <img src="https://ireland.apollo.olxcdn.com/v1/files/a/image" />
            <img src="https://ireland.apollo.olxcdn.com/v1/files/b/image" />
            <img src="https://static.example.com/logo.png" />
            <img src="https://img.otodom.pl/c.jpg" />
            <img src="https://ireland.apollo.olxcdn.com/v1/files/b/image" />
        </body></html>
    "#;

    #[test]
    fn test_meta_extraction() {
        let doc = Html::parse_document(PAGE);
        let extracted = extract_from_meta(&doc);
        assert_eq!(extracted.listing.title, "Dom z ogrodem");
        assert_eq!(extracted.listing.price, "1 250 000 zł");
        assert_eq!(
            extracted.photo_urls,
            vec![
                "https://ireland.apollo.olxcdn.com/v1/files/a/image",
                "https://ireland.apollo.olxcdn.com/v1/files/b/image",
                "https://img.otodom.pl/c.jpg",
            ]
        );
        assert_eq!(extracted.source, ExtractionSource::MetaTags);
        assert_eq!(extracted.listing.location, "");
    }

    #[test]
    fn test_price_regex() {
        assert_eq!(find_price("Cena: 499000PLN").as_deref(), Some("499000PLN"));
        assert_eq!(find_price("Tylko 350 000 ZL!").as_deref(), Some("350 000 ZL"));
        assert_eq!(find_price("koszt 12 pln miesiecznie, 900 000 zł").as_deref(), Some("12 pln"));
        assert_eq!(find_price("brak ceny"), None);
    }

    #[test]
    fn test_empty_document() {
        let doc = Html::parse_document("<html><body><p>nic</p></body></html>");
        let extracted = extract_from_meta(&doc);
        assert_eq!(extracted.listing, ListingRecord::default());
        assert!(extracted.photo_urls.is_empty());
    }
}
