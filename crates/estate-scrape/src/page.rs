//! Listing page adapter: page-state JSON first, meta tags as fallback.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::extract::{extract_listing, ExtractedListing};
use crate::fallback::extract_from_meta;

static NEXT_DATA: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script#__NEXT_DATA__"#).expect("valid selector")
});

/// Location of the ad object inside the page state.
const AD_POINTER: &str = "/props/pageProps/ad";

/// Why the page-state path was not usable.
#[derive(Debug, Error)]
enum PageStateError {
    #[error("no page-state script")]
    MissingScript,
    #[error("invalid page-state JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no ad object in page state")]
    MissingAd,
}

fn page_state_ad(doc: &Html) -> Result<Value, PageStateError> {
    let script = doc
        .select(&NEXT_DATA)
        .next()
        .ok_or(PageStateError::MissingScript)?;
    let raw: String = script.text().collect();
    let mut state: Value = serde_json::from_str(raw.trim())?;

    match state.pointer_mut(AD_POINTER).map(Value::take) {
        Some(ad @ Value::Object(_)) => Ok(ad),
        _ => Err(PageStateError::MissingAd),
    }
}

/// Extract a listing from a fetched page.
///
/// Any problem with the embedded page state (absent script, invalid JSON,
/// unexpected shape) falls back to meta-tag extraction.
pub fn parse_listing_page(html: &str) -> ExtractedListing {
    let doc = Html::parse_document(html);

    match page_state_ad(&doc) {
        Ok(ad) => extract_listing(&ad),
        Err(reason) => {
            debug!(reason = %reason, "Page state unusable, falling back to meta tags");
            extract_from_meta(&doc)
        }
    }
}
