//! Security utilities for input validation and sanitization.
//!
//! This module provides:
//! - Listing URL validation against an allow-list (SSRF protection)
//! - Upload file-name sanitization
//! - Output file-name validation for downloads

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

/// Maximum URL length to prevent DoS attacks.
const MAX_URL_LENGTH: usize = 2048;

/// Maximum stored file-name length.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Blocked URL patterns (sensitive endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Block internal IP ranges
        Regex::new(r"^https?://127\.").unwrap(),
        Regex::new(r"^https?://localhost").unwrap(),
        Regex::new(r"^https?://0\.").unwrap(),
        Regex::new(r"^https?://10\.").unwrap(),
        Regex::new(r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.").unwrap(),
        Regex::new(r"^https?://192\.168\.").unwrap(),
        Regex::new(r"^https?://169\.254\.").unwrap(),
        Regex::new(r"^https?://\[::1\]").unwrap(),
        Regex::new(r"^https?://\[fd").unwrap(),
        Regex::new(r"^https?://\[fe80").unwrap(),
        // Block cloud metadata endpoints
        Regex::new(r"^https?://metadata\.").unwrap(),
        Regex::new(r"^https?://metadata\.google\.internal").unwrap(),
    ]
});

/// Result of URL validation.
#[derive(Debug)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(String),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL domain is not in the allow-list.
    DomainNotAllowed(String),
    /// URL matches a blocked pattern (e.g., internal IPs).
    Blocked(String),
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) => Err(msg),
            Self::DomainNotAllowed(domain) => {
                Err(format!("Domena '{}' nie jest obsługiwana", domain))
            }
            Self::Blocked(reason) => Err(reason),
            Self::TooLong => Err(format!("Adres URL przekracza {} znaków", MAX_URL_LENGTH)),
        }
    }
}

/// Validate a listing URL.
///
/// Checks length, protocol (http/https only), blocked internal patterns and
/// the domain allow-list.
pub fn validate_listing_url(url: &str, allowed_domains: &[String]) -> UrlValidationResult {
    if url.len() > MAX_URL_LENGTH {
        return UrlValidationResult::TooLong;
    }

    let url = url.trim();
    if url.is_empty() {
        return UrlValidationResult::Invalid("Podaj adres URL ogłoszenia".to_string());
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return UrlValidationResult::Invalid(format!("Nieprawidłowy adres URL: {}", e)),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return UrlValidationResult::Invalid(format!(
                "Nieobsługiwany protokół '{}'. Dozwolone są tylko HTTP i HTTPS.",
                scheme
            ))
        }
    }

    for pattern in BLOCKED_PATTERNS.iter() {
        if pattern.is_match(url) {
            warn!(url = %url, "Blocked URL pattern detected");
            return UrlValidationResult::Blocked(
                "Adres URL wskazuje na zasób wewnętrzny".to_string(),
            );
        }
    }

    let domain = match parsed.host_str() {
        Some(d) => d.to_lowercase(),
        None => return UrlValidationResult::Invalid("Adres URL musi zawierać domenę".to_string()),
    };

    if !is_domain_allowed(&domain, allowed_domains) {
        return UrlValidationResult::DomainNotAllowed(domain);
    }

    UrlValidationResult::Valid(url.to_string())
}

/// Check if a domain or any of its parent domains is allowed.
fn is_domain_allowed(domain: &str, allowed_domains: &[String]) -> bool {
    let mut candidate = domain;
    loop {
        if allowed_domains.iter().any(|d| d == candidate) {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return false,
        }
    }
}

/// Sanitize an uploaded file name.
///
/// Directory components are stripped and spaces become underscores. Names
/// containing `..`, hidden names and empty names are rejected.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base.starts_with('.') || base.contains("..") {
        return None;
    }

    let clean: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    if clean.is_empty() || clean.len() > MAX_FILE_NAME_LENGTH {
        return None;
    }
    Some(clean)
}

/// Validate an output file name requested for download.
///
/// Valid format: alphanumeric, hyphens, underscores, dots. No path traversal.
pub fn is_valid_output_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_FILE_NAME_LENGTH {
        return false;
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
