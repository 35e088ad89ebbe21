use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::links::name_source_url;
use crate::catalog::platform_from_url;
use crate::db::{PersistenceGateway, SqliteStore};
use crate::error::{AppError, Result};
use crate::orchestrator::Orchestrator;
use crate::types::{ListingRecord, PriceHistoryPoint, Product};

/// What the scheduler drives on every pass.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    async fn product_ids(&self) -> Result<Vec<i64>>;

    async fn refresh_product(&self, product_id: i64) -> Result<usize>;

    /// Retention pruning after a scheduled pass. Returns rows removed.
    async fn prune(&self, older_than_days: u32) -> Result<u64>;
}

pub struct ProductService {
    store: SqliteStore,
    orchestrator: Arc<Orchestrator>,
}

impl ProductService {
    pub fn new(store: SqliteStore, orchestrator: Arc<Orchestrator>) -> Self {
        Self { store, orchestrator }
    }

    /// Existing product (no re-fetch) or a freshly created one with its listings.
    pub async fn add_by_name(&self, name: &str) -> Result<(Product, Vec<ListingRecord>)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Config("product name must not be empty".to_string()));
        }

        let source_url = name_source_url(name);
        if let Some(existing) = self.store.find_product_by_url(&source_url).await? {
            info!(product_id = existing.id, "Product already tracked: {name}");
            let listings = self.store.listings(existing.id).await?;
            return Ok((existing, listings));
        }

        // Fetch before inserting so a failed add leaves no empty product behind.
        let mut fetched = self.orchestrator.fetch_all(name, 0).await?;
        let product = self.store.insert_product(name, &source_url).await?;
        for listing in &mut fetched {
            listing.product_id = product.id;
            self.store.save_listing(listing).await?;
        }
        info!(product_id = product.id, count = fetched.len(), "Added product: {name}");

        let listings = self.store.listings(product.id).await?;
        Ok((product, listings))
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Product>> {
        self.store.search_products(term).await
    }

    pub async fn all_products(&self) -> Result<Vec<Product>> {
        self.store.all_products().await
    }

    pub async fn product(&self, product_id: i64) -> Result<Product> {
        self.store
            .product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
    }

    pub async fn listings(&self, product_id: i64) -> Result<Vec<ListingRecord>> {
        self.product(product_id).await?;
        self.store.listings(product_id).await
    }

    pub async fn history(&self, listing_id: i64, days: u32) -> Result<Vec<PriceHistoryPoint>> {
        if !self.store.listing_exists(listing_id).await? {
            return Err(AppError::NotFound(format!("listing {listing_id}")));
        }
        self.store.history(listing_id, days).await
    }

    /// Re-fetch one product from its stored source URL. Returns listings saved.
    pub async fn refresh(&self, product_id: i64) -> Result<usize> {
        let product = self.product(product_id).await?;

        let saved = match platform_from_url(&product.source_url) {
            Some(platform) => {
                let listing = self.orchestrator.fetch_one(platform, &product.name, product.id).await?;
                self.store.save_listing(&listing).await?;
                1
            }
            None => {
                let listings = self.orchestrator.fetch_all(&product.name, product.id).await?;
                for listing in &listings {
                    self.store.save_listing(listing).await?;
                }
                listings.len()
            }
        };

        self.store.touch_product(product.id).await?;
        info!(product_id, saved, "Refreshed {}", product.name);
        Ok(saved)
    }
}

#[async_trait]
impl RefreshTarget for ProductService {
    async fn product_ids(&self) -> Result<Vec<i64>> {
        self.store.product_ids().await
    }

    async fn refresh_product(&self, product_id: i64) -> Result<usize> {
        self.refresh(product_id).await
    }

    async fn prune(&self, older_than_days: u32) -> Result<u64> {
        self.store.prune_history(older_than_days).await
    }
}
