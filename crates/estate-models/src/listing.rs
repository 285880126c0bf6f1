//! Listing record models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a photo stored in a session upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PhotoRef {
    /// File name inside the session directory
    pub name: String,
    /// Path relative to the public directory (e.g. `uploads/ab12cd34/foto.jpg`)
    pub path: String,
}

impl PhotoRef {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Normalized real-estate listing.
///
/// Every field defaults to an empty value; serialization always emits all
/// keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ListingRecord {
    pub title: String,
    /// Address components joined with ", "
    pub location: String,
    /// Formatted price, e.g. "1 850 000 PLN"
    pub price: String,
    /// Area with unit, e.g. "95 m2"
    pub area: String,
    /// Room count with pluralized unit, e.g. "4 pokoje"
    pub rooms: String,
    pub floor: String,
    pub year: String,
    pub features: Vec<String>,
    pub photos: Vec<PhotoRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializes_every_key() {
        let json = serde_json::to_value(ListingRecord::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["title", "location", "price", "area", "rooms", "floor", "year"] {
            assert_eq!(obj[key], serde_json::json!(""), "{key}");
        }
        assert_eq!(obj["features"], serde_json::json!([]));
        assert_eq!(obj["photos"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_keys_deserialize_to_defaults() {
        let record: ListingRecord = serde_json::from_str(r#"{"title":"Dom"}"#).unwrap();
        assert_eq!(record.title, "Dom");
        assert!(record.features.is_empty());
        assert_eq!(record.price, "");
    }
}
