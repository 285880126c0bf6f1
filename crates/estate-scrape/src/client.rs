//! Listing page HTTP client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, info, warn};

use crate::error::{ScrapeError, ScrapeResult};
use crate::extract::ExtractedListing;
use crate::guard::{parse_public_url, redirect_policy, PublicResolver};
use crate::page::parse_listing_page;

/// Browser-like user agent; listing sites reject obvious bots.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Configuration for the listing scraper.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Timeout for fetching the listing page
    pub timeout: Duration,
    /// Timeout for each photo download
    pub photo_timeout: Duration,
    /// Maximum number of photos downloaded per listing
    pub max_photos: usize,
    /// Largest accepted listing page body
    pub max_page_bytes: usize,
    /// Largest accepted photo body
    pub max_photo_bytes: usize,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            photo_timeout: Duration::from_secs(15),
            max_photos: 5,
            max_page_bytes: 5 * 1024 * 1024,   // 5MB
            max_photo_bytes: 15 * 1024 * 1024, // 15MB
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScraperConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: std::env::var("SCRAPE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            photo_timeout: std::env::var("SCRAPE_PHOTO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.photo_timeout),
            max_photos: std::env::var("SCRAPE_MAX_PHOTOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_photos),
            max_page_bytes: std::env::var("SCRAPE_MAX_PAGE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_page_bytes),
            max_photo_bytes: std::env::var("SCRAPE_MAX_PHOTO_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_photo_bytes),
            user_agent: std::env::var("SCRAPE_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// A downloaded listing photo.
#[derive(Debug, Clone)]
pub struct FetchedPhoto {
    pub url: String,
    pub bytes: Vec<u8>,
    /// File extension derived from the response content type
    pub extension: &'static str,
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type.map(|c| c.split(';').next().unwrap_or(c).trim()) {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        _ => "jpg",
    }
}

/// Source of listing data and photos.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch a listing page and extract its data.
    async fn scrape(&self, url: &str) -> ScrapeResult<ExtractedListing>;

    /// Download listing photos.
    ///
    /// Failed photos are skipped; the result holds whatever succeeded, in
    /// the original order.
    async fn fetch_photos(&self, urls: &[String]) -> Vec<FetchedPhoto>;
}

fn request_error(e: reqwest::Error, timeout: Duration) -> ScrapeError {
    if e.is_timeout() {
        ScrapeError::Timeout(timeout)
    } else {
        ScrapeError::Network(e)
    }
}

/// Read a response body, failing once it grows past `limit` bytes.
async fn read_capped(mut response: Response, limit: usize, timeout: Duration) -> ScrapeResult<Vec<u8>> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(ScrapeError::TooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| request_error(e, timeout))? {
        if body.len() + chunk.len() > limit {
            return Err(ScrapeError::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Fetches listing pages and their photos over HTTP.
///
/// Only public hosts are contacted, including on redirects and after DNS
/// resolution.
pub struct ListingScraper {
    http: Client,
    config: ScraperConfig,
}

impl ListingScraper {
    /// Create a new scraper.
    pub fn new(config: ScraperConfig) -> ScrapeResult<Self> {
        Self::with_client_builder(config, Client::builder())
    }

    /// Create a scraper on top of a preconfigured client builder.
    ///
    /// The user agent, timeout, redirect policy and resolver are always
    /// applied on top of it.
    pub fn with_client_builder(config: ScraperConfig, builder: ClientBuilder) -> ScrapeResult<Self> {
        let http = builder
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .redirect(redirect_policy())
            .dns_resolver(Arc::new(PublicResolver))
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ScrapeResult<Self> {
        Self::new(ScraperConfig::from_env())
    }

    /// Fetch the raw HTML of a listing page.
    pub async fn fetch_page(&self, url: &str) -> ScrapeResult<String> {
        let url = parse_public_url(url)?;
        debug!(url = %url, "Fetching listing page");

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .header(ACCEPT_LANGUAGE, "pl-PL,pl;q=0.9")
            .send()
            .await
            .map_err(|e| request_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Listing page request failed");
            return Err(ScrapeError::from_status(status));
        }

        let body = read_capped(response, self.config.max_page_bytes, self.config.timeout).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_photo(&self, url: &str) -> ScrapeResult<FetchedPhoto> {
        let parsed = parse_public_url(url)?;
        let response = self
            .http
            .get(parsed)
            .timeout(self.config.photo_timeout)
            .send()
            .await
            .map_err(|e| request_error(e, self.config.photo_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::from_status(status));
        }

        let extension = extension_for(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = read_capped(response, self.config.max_photo_bytes, self.config.photo_timeout).await?;
        if bytes.is_empty() {
            return Err(ScrapeError::UnexpectedStatus(status.as_u16()));
        }

        Ok(FetchedPhoto {
            url: url.to_string(),
            bytes,
            extension,
        })
    }
}

#[async_trait]
impl ListingSource for ListingScraper {
    async fn scrape(&self, url: &str) -> ScrapeResult<ExtractedListing> {
        let html = self.fetch_page(url).await?;
        let extracted = parse_listing_page(&html);

        info!(
            url = %url,
            source = extracted.source.as_str(),
            photos = extracted.photo_urls.len(),
            "Listing extracted"
        );

        Ok(extracted)
    }

    async fn fetch_photos(&self, urls: &[String]) -> Vec<FetchedPhoto> {
        let mut photos = Vec::new();

        for url in urls.iter().take(self.config.max_photos) {
            match self.fetch_photo(url).await {
                Ok(photo) => photos.push(photo),
                Err(e) => warn!(url = %url, error = %e, "Skipping listing photo"),
            }
        }

        photos
    }
}
