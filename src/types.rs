use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Limited Stock")]
    LimitedStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl Availability {
    /// Lenient parse of free-text stock labels ("In Stock", "limited", "out_of_stock").
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if norm.is_empty() {
            return None;
        }
        if norm.starts_with("outofstock") || norm == "unavailable" || norm == "soldout" {
            Some(Availability::OutOfStock)
        } else if norm.starts_with("limited") || norm.starts_with("fewleft") || norm.starts_with("only") {
            Some(Availability::LimitedStock)
        } else if norm.starts_with("instock") || norm == "available" {
            Some(Availability::InStock)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Availability::InStock => "In Stock",
            Availability::LimitedStock => "Limited Stock",
            Availability::OutOfStock => "Out of Stock",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// One platform's snapshot of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformListing {
    pub product_id: i64,
    pub platform: String,
    /// Price <= 0 means "missing"; such listings never leave the pipeline.
    pub price: f64,
    pub rating: f64,
    pub review_count: u32,
    pub seller: String,
    pub delivery_estimate: String,
    pub return_policy: String,
    pub warranty: String,
    pub offer_text: String,
    pub availability: Availability,
    pub product_link: String,
    /// Nanosecond UTC epoch.
    pub last_updated: i64,
}

impl PlatformListing {
    pub fn has_price(&self) -> bool {
        self.price > 0.0 && self.price.is_finite()
    }
}

/// A persisted listing together with its row id (the history key).
#[derive(Debug, Clone, Serialize)]
pub struct ListingRecord {
    pub id: i64,
    #[serde(flatten)]
    pub listing: PlatformListing,
}

// ---------------------------------------------------------------------------
// Products and history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub source_url: String,
    pub created_at: i64,
    pub last_updated: i64,
}

/// Append-only price observation for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistoryPoint {
    pub id: i64,
    pub listing_id: i64,
    pub price: f64,
    pub recorded_at: i64,
}

// ---------------------------------------------------------------------------
// Refresh pass reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassTrigger {
    Scheduled,
    Manual,
}

impl std::fmt::Display for PassTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassTrigger::Scheduled => write!(f, "scheduled"),
            PassTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Sent from the scheduler after every refresh pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub trigger: PassTrigger,
    pub refreshed: usize,
    pub failed: usize,
    /// True when the pass stopped early because the scheduler was stopped.
    pub interrupted: bool,
    pub started_at_ns: i64,
    pub finished_at_ns: i64,
}

pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}
