//! Per-request fetch strategy.
//!
//! Navigation loads stay fresh (network-first), static assets stay instant
//! (cache-first), and anything outside the app's origin or scheme is never
//! touched by the cache.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Prefer the freshest HTML; fall back to cache when offline.
    NetworkFirst,
    /// Serve from cache, populating it from the network on a miss.
    CacheFirst,
    /// Forward straight to the network; never read or write the cache.
    Bypass,
}

/// The slice of a request the cache needs to route it.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: String,
    pub url: Url,
    /// True when the request loads the document itself.
    pub navigation: bool,
}

impl AssetRequest {
    pub fn get(url: Url, navigation: bool) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            navigation,
        }
    }
}

/// Classifies a request against the app origin.
pub fn classify(request: &AssetRequest, app_origin: &Url) -> FetchStrategy {
    if !request.method.eq_ignore_ascii_case("GET") {
        return FetchStrategy::Bypass;
    }
    if !matches!(request.url.scheme(), "http" | "https") {
        return FetchStrategy::Bypass;
    }
    if request.url.origin() != app_origin.origin() {
        return FetchStrategy::Bypass;
    }
    if request.navigation {
        FetchStrategy::NetworkFirst
    } else {
        FetchStrategy::CacheFirst
    }
}
