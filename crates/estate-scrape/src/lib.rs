//! Listing page fetcher and extractor.
//!
//! This crate provides:
//! - Extraction of a [`ListingRecord`](estate_models::ListingRecord) from the
//!   page-state JSON embedded in listing pages
//! - An independent HTML meta-tag fallback
//! - An HTTP client that fetches listing pages and their photos from public
//!   hosts only

pub mod client;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod guard;
pub mod page;

pub use client::{FetchedPhoto, ListingScraper, ListingSource, ScraperConfig};
pub use error::{ScrapeError, ScrapeResult};
pub use extract::{extract_listing, format_price, label_rooms, ExtractedListing, ExtractionSource};
pub use fallback::extract_from_meta;
pub use page::parse_listing_page;
