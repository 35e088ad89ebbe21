use async_trait::async_trait;

use crate::error::Result;
use crate::types::PlatformListing;

/// One data-acquisition strategy in the fallback chain.
///
/// `Err` and `Ok(vec![])` both mean "fall through to the next provider".
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Provider name for logging and latency stats.
    fn name(&self) -> &'static str;

    async fn try_fetch(
        &self,
        product_name: &str,
        product_id: i64,
        platforms: &[String],
    ) -> Result<Vec<PlatformListing>>;

    /// True when the provider can only answer for a whole platform set at once,
    /// so a single-platform query must ask for the full set and filter.
    fn batch_only(&self) -> bool {
        false
    }
}
