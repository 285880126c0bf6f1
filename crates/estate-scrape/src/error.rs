//! Scrape error types.

use std::time::Duration;

use thiserror::Error;

pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Serwis zablokował pobieranie strony (HTTP {0})")]
    Blocked(u16),

    #[error("Błąd serwera ogłoszeń (HTTP {0})")]
    UpstreamServer(u16),

    #[error("Przekroczono czas oczekiwania na stronę ({0:?})")]
    Timeout(Duration),

    #[error("Nie udało się pobrać strony (HTTP {0})")]
    UnexpectedStatus(u16),

    #[error("Nie udało się pobrać strony: {0}")]
    Network(#[from] reqwest::Error),

    /// Not http(s), or the host is internal
    #[error("Niedozwolony adres: {0}")]
    UnsafeUrl(String),

    #[error("Odpowiedź przekracza limit {0} bajtów")]
    TooLarge(usize),

    #[error("Client configuration error: {0}")]
    Client(String),
}

impl ScrapeError {
    /// Classify an HTTP status that is not a success.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let code = status.as_u16();
        match code {
            401 | 403 | 429 => Self::Blocked(code),
            500..=599 => Self::UpstreamServer(code),
            _ => Self::UnexpectedStatus(code),
        }
    }

    /// Short machine-readable kind, used for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Blocked(_) => "blocked",
            Self::UpstreamServer(_) => "server_error",
            Self::Timeout(_) => "timeout",
            Self::UnsafeUrl(_) => "unsafe_url",
            Self::TooLarge(_) => "too_large",
            Self::UnexpectedStatus(_) | Self::Network(_) | Self::Client(_) => "generic",
        }
    }
}
