use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::api::latency::LatencyStats;
use crate::catalog::{canonical_platform, classify, relevant_platforms};
use crate::error::{AppError, Result};
use crate::provider::ListingProvider;
use crate::types::PlatformListing;

/// Runs providers strictly in order until one yields usable listings.
pub struct Orchestrator {
    /// Order for whole-set queries.
    chain: Vec<Arc<dyn ListingProvider>>,
    /// Order for single-platform queries.
    single: Vec<Arc<dyn ListingProvider>>,
    latency: Arc<LatencyStats>,
}

impl Orchestrator {
    pub fn new(
        chain: Vec<Arc<dyn ListingProvider>>,
        single: Vec<Arc<dyn ListingProvider>>,
        latency: Arc<LatencyStats>,
    ) -> Self {
        Self { chain, single, latency }
    }

    /// Listings for every relevant platform, from the first provider that
    /// returns a non-empty usable set.
    pub async fn fetch_all(&self, product_name: &str, product_id: i64) -> Result<Vec<PlatformListing>> {
        let category = classify(product_name);
        let platforms: Vec<String> = category.platforms().iter().map(|p| p.to_string()).collect();
        info!(product = product_name, %category, platforms = ?platforms, "Fetching listings");

        for provider in &self.chain {
            match self.attempt(provider.as_ref(), product_name, product_id, &platforms).await {
                Ok(listings) if !listings.is_empty() => {
                    info!(
                        product = product_name,
                        provider = provider.name(),
                        count = listings.len(),
                        "Listings sourced from {}",
                        provider.name(),
                    );
                    return Ok(listings);
                }
                Ok(_) => info!(provider = provider.name(), "Provider returned nothing, falling through"),
                Err(e) => warn!(provider = provider.name(), "Provider failed, falling through: {e}"),
            }
        }

        Err(AppError::NoData(product_name.to_string()))
    }

    /// One platform's listing. Batch-only providers are asked for the full
    /// relevant set and the platform is picked out by name.
    pub async fn fetch_one(&self, platform_hint: &str, product_name: &str, product_id: i64) -> Result<PlatformListing> {
        let target = canonical_platform(platform_hint).unwrap_or(platform_hint).to_string();

        for provider in &self.single {
            let request = if provider.batch_only() {
                let mut all = relevant_platforms(product_name);
                if !all.iter().any(|p| p.eq_ignore_ascii_case(&target)) {
                    all.push(target.clone());
                }
                all
            } else {
                vec![target.clone()]
            };

            match self.attempt(provider.as_ref(), product_name, product_id, &request).await {
                Ok(listings) => {
                    if let Some(hit) = listings.into_iter().find(|l| l.platform.eq_ignore_ascii_case(&target)) {
                        info!(platform = %target, provider = provider.name(), "Single listing sourced");
                        return Ok(hit);
                    }
                    info!(platform = %target, provider = provider.name(), "No listing for platform, falling through");
                }
                Err(e) => warn!(platform = %target, provider = provider.name(), "Provider failed: {e}"),
            }
        }

        Err(AppError::NoData(format!("{product_name} on {target}")))
    }

    async fn attempt(
        &self,
        provider: &dyn ListingProvider,
        product_name: &str,
        product_id: i64,
        platforms: &[String],
    ) -> Result<Vec<PlatformListing>> {
        let started = Instant::now();
        let outcome = provider.try_fetch(product_name, product_id, platforms).await;
        self.latency.record(provider.name(), started.elapsed());
        outcome.map(usable)
    }
}

/// Drop unpriced listings and repeated platforms (first wins).
fn usable(listings: Vec<PlatformListing>) -> Vec<PlatformListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| l.has_price())
        .filter(|l| seen.insert(l.platform.clone()))
        .collect()
}
