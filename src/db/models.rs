//! Row types for the tables in migrations/, decoded with sqlx::FromRow.
use crate::types::{Availability, ListingRecord, PlatformListing, PriceHistoryPoint, Product};

#[derive(Debug, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub source_url: String,
    pub created_at: i64,
    pub last_updated: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id,
            name: r.name,
            source_url: r.source_url,
            created_at: r.created_at,
            last_updated: r.last_updated,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub product_id: i64,
    pub platform: String,
    pub price: f64,
    pub rating: f64,
    pub reviewcount: i64,
    pub seller: String,
    pub delivery_time: String,
    pub return_policy: String,
    pub warranty: String,
    pub offers: String,
    pub availability: String,
    pub product_link: String,
    pub last_scraped: i64,
}

impl From<ListingRow> for ListingRecord {
    fn from(r: ListingRow) -> Self {
        ListingRecord {
            id: r.id,
            listing: PlatformListing {
                product_id: r.product_id,
                platform: r.platform,
                price: r.price,
                rating: r.rating,
                review_count: u32::try_from(r.reviewcount).unwrap_or(0),
                seller: r.seller,
                delivery_estimate: r.delivery_time,
                return_policy: r.return_policy,
                warranty: r.warranty,
                offer_text: r.offers,
                availability: Availability::parse(&r.availability).unwrap_or(Availability::InStock),
                product_link: r.product_link,
                last_updated: r.last_scraped,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: i64,
    pub product_detail_id: i64,
    pub price: f64,
    pub recorded_at: i64,
}

impl From<PriceHistoryRow> for PriceHistoryPoint {
    fn from(r: PriceHistoryRow) -> Self {
        PriceHistoryPoint {
            id: r.id,
            listing_id: r.product_detail_id,
            price: r.price,
            recorded_at: r.recorded_at,
        }
    }
}
