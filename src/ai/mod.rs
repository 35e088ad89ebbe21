pub mod client;
pub mod parse;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

pub use client::{GeminiClient, TextGenerator};

use crate::config::{AI_MAX_ATTEMPTS, AI_RETRY_DELAY};
use crate::error::{AiError, Result};
use crate::provider::ListingProvider;
use crate::types::PlatformListing;

/// Listing generation through a hosted text model, with bounded retry on
/// transport and status failures.
pub struct AiProvider {
    generator: Option<Arc<dyn TextGenerator>>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl AiProvider {
    /// `None` means no usable key: every call fails fast with `NotConfigured`.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            generator,
            max_attempts: AI_MAX_ATTEMPTS,
            retry_delay: AI_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn generate_all(
        &self,
        product_name: &str,
        product_id: i64,
        platforms: &[String],
    ) -> std::result::Result<Vec<PlatformListing>, AiError> {
        let generator = self.generator.as_ref().ok_or(AiError::NotConfigured)?;
        let prompt = prompt::listing_prompt(product_name, platforms);

        let mut attempt = 0;
        let raw = loop {
            attempt += 1;
            match generator.generate(&prompt).await {
                Ok(text) => break text,
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        generator = generator.name(),
                        attempt,
                        "AI attempt failed, retrying in {:?}: {e}",
                        self.retry_delay,
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        let (listings, stats) = parse::parse_listings(&raw, product_name, product_id)?;
        info!(
            product = product_name,
            accepted = stats.accepted,
            rejected = stats.rejected(),
            "[AI] parsed {} listings (rejected: platform={} numbers={} seller={} availability={} shape={})",
            stats.accepted,
            stats.rejected_platform,
            stats.rejected_numbers,
            stats.rejected_seller,
            stats.rejected_availability,
            stats.rejected_shape,
        );
        Ok(listings)
    }

    /// Free-text buying advice over stored listings.
    pub async fn advise(&self, listings: &[PlatformListing]) -> std::result::Result<String, AiError> {
        let generator = self.generator.as_ref().ok_or(AiError::NotConfigured)?;
        generator.generate(&prompt::advice_prompt(listings)).await
    }
}

#[async_trait]
impl ListingProvider for AiProvider {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn try_fetch(
        &self,
        product_name: &str,
        product_id: i64,
        platforms: &[String],
    ) -> Result<Vec<PlatformListing>> {
        Ok(self.generate_all(product_name, product_id, platforms).await?)
    }

    fn batch_only(&self) -> bool {
        true
    }
}

/// Scripted generator for tests.
#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub struct ScriptedGenerator {
        replies: Mutex<VecDeque<std::result::Result<String, AiError>>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<std::result::Result<String, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> std::result::Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AiError::NoData))
        }
    }

    pub const ONE_VALID: &str = r#"{"platforms":[
        {"platform":"","price":500,"rating":4.0,"seller":"nobody","availability":"In Stock"},
        {"platform":"Flipkart","price":79999,"rating":4.4,"reviewCount":5400,
         "seller":"RetailNet","deliveryTime":"2-3 days","returnPolicy":"10 days",
         "warranty":"1 year","offers":"Bank offer","availability":"In Stock"}
    ]}"#;

    fn provider(replies: Vec<std::result::Result<String, AiError>>) -> (AiProvider, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::new(replies));
        let provider = AiProvider::new(Some(generator.clone() as Arc<dyn TextGenerator>))
            .with_retry_delay(Duration::ZERO);
        (provider, generator)
    }

    fn platforms() -> Vec<String> {
        vec!["Amazon".to_string(), "Flipkart".to_string()]
    }

    #[tokio::test]
    async fn returns_only_the_valid_entry() {
        let (provider, _) = provider(vec![Ok(ONE_VALID.to_string())]);
        let out = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].platform, "Flipkart");
    }

    #[tokio::test]
    async fn retries_transient_failure_once() {
        let (provider, generator) = provider(vec![
            Err(AiError::Status { status: 503, body: "overloaded".into() }),
            Ok(ONE_VALID.to_string()),
        ]);
        let out = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_two_attempts() {
        let (provider, generator) = provider(vec![
            Err(AiError::Transport("reset".into())),
            Err(AiError::Transport("reset".into())),
            Ok(ONE_VALID.to_string()),
        ]);
        let err = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap_err();
        assert!(matches!(err, AiError::Transport(_)));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn empty_response_is_not_retried() {
        let (provider, generator) = provider(vec![Err(AiError::NoData), Ok(ONE_VALID.to_string())]);
        let err = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap_err();
        assert!(matches!(err, AiError::NoData));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_retried() {
        let (provider, generator) = provider(vec![Ok("sorry, I can't".into()), Ok(ONE_VALID.to_string())]);
        let err = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let provider = AiProvider::new(None);
        assert!(!provider.is_configured());
        let err = provider.generate_all("iPhone 15", 1, &platforms()).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
        assert!(provider.try_fetch("iPhone 15", 1, &platforms()).await.is_err());
    }
}
