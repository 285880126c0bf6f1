//! Application state.

#[cfg(feature = "scrape")]
use std::sync::Arc;

use estate_render::RenderService;
#[cfg(feature = "scrape")]
use estate_scrape::{ListingScraper, ListingSource};
#[cfg(feature = "scrape")]
use tracing::warn;

use crate::config::ApiConfig;
use crate::services::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub sessions: SessionStore,
    pub renderer: RenderService,
    /// Listing scraper; `None` when it could not be built
    #[cfg(feature = "scrape")]
    pub scraper: Option<Arc<dyn ListingSource>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, renderer: RenderService) -> Self {
        let sessions = SessionStore::new(config.uploads_dir());

        #[cfg(feature = "scrape")]
        let scraper = match ListingScraper::from_env() {
            Ok(scraper) => Some(Arc::new(scraper) as Arc<dyn ListingSource>),
            Err(e) => {
                warn!("Listing scraper unavailable: {}", e);
                None
            }
        };

        Self {
            config,
            sessions,
            renderer,
            #[cfg(feature = "scrape")]
            scraper,
        }
    }

    /// Use a different listing source.
    #[cfg(feature = "scrape")]
    pub fn with_scraper(self, scraper: Arc<dyn ListingSource>) -> Self {
        Self {
            scraper: Some(scraper),
            ..self
        }
    }

    /// Disable listing extraction.
    pub fn without_scraper(self) -> Self {
        #[cfg(feature = "scrape")]
        {
            Self {
                scraper: None,
                ..self
            }
        }
        #[cfg(not(feature = "scrape"))]
        {
            self
        }
    }
}
