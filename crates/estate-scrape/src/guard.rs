//! Outbound address checks.
//!
//! Every URL the scraper fetches comes from user input or from a scraped
//! page, so each one must point at a public host:
//! - URLs with literal or well-known internal hosts are rejected before the
//!   request ([`check_public_url`])
//! - every redirect hop is re-checked ([`redirect_policy`])
//! - host names resolving only to internal addresses fail at DNS time
//!   ([`PublicResolver`])

use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use url::{Host, Url};

use crate::error::{ScrapeError, ScrapeResult};

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

fn is_internal_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || a == 0
        // Carrier-grade NAT, 100.64.0.0/10
        || (a == 100 && (b & 0xC0) == 64)
}

fn is_internal_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_ipv4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // Unique local, fc00::/7
        || (first & 0xFE00) == 0xFC00
        // Link local, fe80::/10
        || (first & 0xFFC0) == 0xFE80
}

/// Whether an address is loopback, private, link-local or otherwise not
/// publicly routable.
pub fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_ipv4(v4),
        IpAddr::V6(v6) => is_internal_ipv6(v6),
    }
}

fn is_internal_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    domain == "localhost"
        || domain.ends_with(".localhost")
        || domain.ends_with(".internal")
        || domain.ends_with(".local")
        || domain.starts_with("metadata.")
}

/// Reject URLs that are not http(s) or whose host is internal.
pub fn check_public_url(url: &Url) -> ScrapeResult<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScrapeError::UnsafeUrl(url.to_string()));
    }

    let internal = match url.host() {
        Some(Host::Ipv4(ip)) => is_internal_ipv4(ip),
        Some(Host::Ipv6(ip)) => is_internal_ipv6(ip),
        Some(Host::Domain(domain)) => is_internal_domain(domain),
        None => true,
    };

    if internal {
        Err(ScrapeError::UnsafeUrl(url.to_string()))
    } else {
        Ok(())
    }
}

/// Parse and check a URL taken from input or from a scraped page.
pub fn parse_public_url(raw: &str) -> ScrapeResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| ScrapeError::UnsafeUrl(raw.to_string()))?;
    check_public_url(&url)?;
    Ok(url)
}

/// Follow at most [`MAX_REDIRECTS`] hops, each to a public host.
pub fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("more than {} redirects", MAX_REDIRECTS));
        }
        if check_public_url(attempt.url()).is_err() {
            let target = attempt.url().to_string();
            return attempt.error(format!("redirect to non-public address {}", target));
        }
        attempt.follow()
    })
}

/// DNS resolver that drops internal addresses from every lookup.
#[derive(Debug, Default)]
pub struct PublicResolver;

async fn resolve_public(host: String) -> Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .filter(|addr| !is_internal_ip(addr.ip()))
        .collect();

    if addrs.is_empty() {
        return Err(format!("{} has no public address", host).into());
    }
    let addrs: Addrs = Box::new(addrs.into_iter());
    Ok(addrs)
}

impl Resolve for PublicResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}
