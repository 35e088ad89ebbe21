//! Page-scrape strategy: a fixed platform subset, each tried against an
//! ordered list of engines until one yields a priced listing.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::catalog::canonical_platform;
use crate::error::Result;
use crate::provider::ListingProvider;
use crate::types::PlatformListing;

pub use http::HttpListingScraper;

/// Platforms with a known result-page layout.
pub const SCRAPE_PLATFORMS: &[&str] = &["Flipkart", "Amazon"];

/// One engine able to pull a single real listing off a platform's search page.
#[async_trait]
pub trait PageScraper: Send + Sync {
    fn name(&self) -> &'static str;

    /// A populated listing, or a definite failure.
    async fn scrape(&self, platform: &str, product_name: &str, product_id: i64) -> Result<PlatformListing>;
}

pub struct ScrapeProvider {
    engines: Vec<Arc<dyn PageScraper>>,
}

impl ScrapeProvider {
    pub fn new(engines: Vec<Arc<dyn PageScraper>>) -> Self {
        Self { engines }
    }

    async fn scrape_platform(
        &self,
        platform: &str,
        product_name: &str,
        product_id: i64,
    ) -> Option<PlatformListing> {
        for engine in &self.engines {
            match engine.scrape(platform, product_name, product_id).await {
                Ok(listing) if listing.has_price() => {
                    debug!(engine = engine.name(), platform, price = listing.price, "Scraped listing");
                    return Some(listing);
                }
                Ok(_) => warn!(engine = engine.name(), platform, "Scrape returned no price"),
                Err(e) => warn!(engine = engine.name(), platform, "Scrape failed: {e}"),
            }
        }
        None
    }
}

#[async_trait]
impl ListingProvider for ScrapeProvider {
    fn name(&self) -> &'static str {
        "scrape"
    }

    async fn try_fetch(
        &self,
        product_name: &str,
        product_id: i64,
        platforms: &[String],
    ) -> Result<Vec<PlatformListing>> {
        let mut listings = Vec::new();
        if self.engines.is_empty() {
            return Ok(listings);
        }

        let targets = platforms
            .iter()
            .filter_map(|p| canonical_platform(p))
            .filter(|p| SCRAPE_PLATFORMS.contains(p));

        for platform in targets {
            if let Some(listing) = self.scrape_platform(platform, product_name, product_id).await {
                listings.push(listing);
            }
        }
        Ok(listings)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::types::{now_ns, Availability};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that succeeds only for the listed platforms.
    pub struct FakeEngine {
        pub ok_for: Vec<&'static str>,
        pub calls: AtomicUsize,
    }

    impl FakeEngine {
        pub fn new(ok_for: Vec<&'static str>) -> Self {
            Self { ok_for, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PageScraper for FakeEngine {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn scrape(&self, platform: &str, _product_name: &str, product_id: i64) -> Result<PlatformListing> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.ok_for.iter().any(|p| *p == platform) {
                return Err(AppError::Scrape(format!("blocked on {platform}")));
            }
            Ok(PlatformListing {
                product_id,
                platform: platform.to_string(),
                price: 999.0,
                rating: 4.2,
                review_count: 10,
                seller: "Seller".to_string(),
                delivery_estimate: "2-3 days".to_string(),
                return_policy: String::new(),
                warranty: String::new(),
                offer_text: String::new(),
                availability: Availability::InStock,
                product_link: String::new(),
                last_updated: now_ns(),
            })
        }
    }

    fn all() -> Vec<String> {
        ["Amazon", "Flipkart", "Meesho", "Tata CLiQ"].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn only_scrapes_the_fixed_subset() {
        let engine = Arc::new(FakeEngine::new(vec!["Amazon", "Flipkart", "Meesho"]));
        let provider = ScrapeProvider::new(vec![engine.clone()]);
        let out = provider.try_fetch("iPhone 15", 1, &all()).await.unwrap();
        let mut platforms: Vec<_> = out.iter().map(|l| l.platform.as_str()).collect();
        platforms.sort_unstable();
        assert_eq!(platforms, vec!["Amazon", "Flipkart"]);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_engine_covers_first_engine_failures() {
        let fast = Arc::new(FakeEngine::new(vec!["Flipkart"]));
        let slow = Arc::new(FakeEngine::new(vec!["Amazon", "Flipkart"]));
        let provider = ScrapeProvider::new(vec![fast.clone(), slow.clone()]);
        let out = provider.try_fetch("iPhone 15", 1, &all()).await.unwrap();
        assert_eq!(out.len(), 2);
        // slow engine only consulted for Amazon
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_engines_yields_empty() {
        let provider = ScrapeProvider::new(Vec::new());
        assert!(provider.try_fetch("iPhone 15", 1, &all()).await.unwrap().is_empty());
    }
}
