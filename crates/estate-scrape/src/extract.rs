//! Listing extraction from the embedded page-state "ad" object.
//!
//! The page-state shape is undocumented and changes without notice, so every
//! lookup here is optional: a missing or oddly typed field produces an empty
//! value, never an error.

use estate_models::ListingRecord;
use serde_json::Value;

/// Where an extracted listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Embedded page-state JSON
    PageState,
    /// HTML meta tags and inline images
    MetaTags,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::PageState => "page_state",
            ExtractionSource::MetaTags => "meta_tags",
        }
    }
}

/// Listing record plus the photo URLs still to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedListing {
    pub listing: ListingRecord,
    pub photo_urls: Vec<String>,
    pub source: ExtractionSource,
}

/// Address components, in the order they are joined.
const LOCATION_COMPONENTS: [&str; 3] = ["city", "district", "street"];

/// Image resolutions, most preferred first.
const IMAGE_RESOLUTIONS: [&str; 3] = ["large", "medium", "small"];

/// Scalar value as text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Extract a listing from the page-state "ad" object.
pub fn extract_listing(ad: &Value) -> ExtractedListing {
    let characteristics = Characteristics::new(ad);

    let listing = ListingRecord {
        title: ad.get("title").and_then(as_text).unwrap_or_default(),
        location: extract_location(ad),
        price: extract_price(ad),
        area: characteristics
            .get("m")
            .map(|v| format!("{} m2", v))
            .unwrap_or_default(),
        rooms: characteristics.get("rooms_num").map(label_rooms).unwrap_or_default(),
        floor: characteristics
            .get("floor_no")
            .map(|v| format!("pietro {}", v))
            .unwrap_or_default(),
        year: characteristics.get("build_year").unwrap_or_default(),
        features: extract_features(ad),
        photos: Vec::new(),
    };

    ExtractedListing {
        listing,
        photo_urls: extract_photo_urls(ad),
        source: ExtractionSource::PageState,
    }
}

fn extract_location(ad: &Value) -> String {
    let Some(address) = ad.pointer("/location/address") else {
        return String::new();
    };

    LOCATION_COMPONENTS
        .iter()
        .filter_map(|key| {
            let component = address.get(*key)?;
            let name = match component {
                Value::Object(_) => component.get("name").and_then(as_text)?,
                other => as_text(other)?,
            };
            non_empty(&name).map(str::to_string)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn extract_price(ad: &Value) -> String {
    if let Some(target) = ad.pointer("/target/Price").filter(|v| v.is_number()) {
        return format_price(target);
    }

    let nested = match ad.get("price") {
        Some(Value::Object(_)) => ad.pointer("/price/value"),
        other => other,
    };

    nested
        .filter(|v| !v.is_null())
        .map(format_price)
        .unwrap_or_default()
}

/// Format a price as an integer with space-separated thousands and " PLN".
///
/// Values that are not numbers (and not numeric strings) pass through as
/// text.
pub fn format_price(value: &Value) -> String {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(' ', "").parse::<f64>().ok(),
        _ => None,
    };

    match number.filter(|n| n.is_finite()) {
        Some(n) => format!("{} PLN", group_thousands(n.trunc() as i64)),
        None => as_text(value).unwrap_or_default(),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Label a room count with the Polish plural ("3 pokoje", "5 pokoi").
///
/// Unparsable values pass through unlabeled.
pub fn label_rooms(value: String) -> String {
    match value.trim().parse::<i64>() {
        Ok(n) if (2..=4).contains(&n) => format!("{} pokoje", n),
        Ok(n) => format!("{} pokoi", n),
        Err(_) => value,
    }
}

/// Key/value attribute list of an ad.
struct Characteristics<'a> {
    entries: &'a [Value],
}

impl<'a> Characteristics<'a> {
    fn new(ad: &'a Value) -> Self {
        let entries = ad
            .get("characteristics")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Self { entries }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| entry.get("key").and_then(Value::as_str) == Some(key))
            .and_then(|entry| entry.get("value"))
            .and_then(as_text)
            .filter(|v| !v.trim().is_empty())
    }
}

fn extract_features(ad: &Value) -> Vec<String> {
    ad.get("featuresByCategory")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|category| category.get("values").and_then(Value::as_array))
        .flatten()
        .filter_map(|feature| feature.as_str().map(str::to_string))
        .collect()
}

fn extract_photo_urls(ad: &Value) -> Vec<String> {
    ad.get("images")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|image| {
            IMAGE_RESOLUTIONS.iter().find_map(|res| {
                image
                    .get(*res)
                    .and_then(Value::as_str)
                    .and_then(non_empty)
                    .map(str::to_string)
            })
        })
        .collect()
}
