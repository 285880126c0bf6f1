//! Listing extraction handler.

use axum::extract::State;
use axum::Json;
use estate_models::ListingRecord;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

const UNAVAILABLE: &str = "Pobieranie ogłoszeń jest niedostępne na tym serwerze";

/// Scrape request body.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Scrape response.
#[derive(Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub session_id: String,
    pub listing: ListingRecord,
}

/// Fetch a listing page, extract its data and save its photos.
#[cfg(feature = "scrape")]
pub async fn scrape_listing(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ScrapeRequest>,
) -> ApiResult<Json<ScrapeResponse>> {
    use estate_scrape::ListingSource;
    use tracing::{info, warn};

    use crate::metrics;
    use crate::security::validate_listing_url;

    let url = validate_listing_url(&request.url, &state.config.scrape_allowed_domains)
        .into_result()
        .map_err(ApiError::bad_request)?;
    let scraper = state
        .scraper
        .clone()
        .ok_or_else(|| ApiError::unavailable(UNAVAILABLE))?;
    let session = state.sessions.resolve_session(request.session_id.as_deref())?;

    let extracted = match scraper.scrape(&url).await {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!(url = %url, error = %e, "Listing fetch failed");
            metrics::record_scrape(e.kind());
            return Err(e.into());
        }
    };

    let mut listing = extracted.listing;
    for photo in scraper.fetch_photos(&extracted.photo_urls).await {
        let name = format!("scraped_{}.{}", listing.photos.len() + 1, photo.extension);
        match state.sessions.save_file(&session, &name, &photo.bytes).await {
            Ok(saved) => listing.photos.push(saved),
            Err(e) => warn!(url = %photo.url, error = %e, "Failed to save scraped photo"),
        }
    }

    info!(
        session_id = %session,
        source = extracted.source.as_str(),
        photos = listing.photos.len(),
        "Listing scraped"
    );
    metrics::record_scrape("success");
    metrics::record_scraped_photos(listing.photos.len());

    Ok(Json(ScrapeResponse {
        success: true,
        session_id: session.to_string(),
        listing,
    }))
}

/// Listing extraction is compiled out.
#[cfg(not(feature = "scrape"))]
pub async fn scrape_listing(
    State(_state): State<AppState>,
    ApiJson(_request): ApiJson<ScrapeRequest>,
) -> ApiResult<Json<ScrapeResponse>> {
    Err(ApiError::unavailable(UNAVAILABLE))
}
