//! Validation of the model's JSON payload into listings.
//!
//! The top level must be an object with a `platforms` array. Each entry is
//! checked on its own; a bad entry is counted and dropped, never fatal to
//! the batch.

use serde::Deserialize;

use crate::catalog::{canonical_platform, search_url};
use crate::error::AiError;
use crate::numeric::sole_number;
use crate::types::{now_ns, Availability, PlatformListing};

#[derive(Debug, Default)]
pub struct ParseStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected_platform: usize,
    pub rejected_numbers: usize,
    pub rejected_seller: usize,
    pub rejected_availability: usize,
    pub rejected_shape: usize,
}

impl ParseStats {
    pub fn rejected(&self) -> usize {
        self.total - self.accepted
    }
}

#[derive(Debug, PartialEq)]
enum Rejection {
    Shape,
    EmptyPlatform,
    UnknownPlatform,
    BadNumber,
    MissingSeller,
    UnknownAvailability,
}

#[derive(Deserialize)]
struct Payload {
    platforms: Vec<serde_json::Value>,
}

/// A number, or a string holding one ("₹79,900").
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        let n = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => sole_number(s),
        };
        n.filter(|n| n.is_finite())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    platform: Option<String>,
    price: Option<Numeric>,
    rating: Option<Numeric>,
    review_count: Option<Numeric>,
    seller: Option<String>,
    #[serde(alias = "deliveryEstimate")]
    delivery_time: Option<String>,
    return_policy: Option<String>,
    warranty: Option<String>,
    #[serde(alias = "offerText")]
    offers: Option<String>,
    availability: Option<String>,
}

/// Remove a surrounding ``` or ```json fence and whitespace.
pub fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

pub fn parse_listings(
    raw: &str,
    product_name: &str,
    product_id: i64,
) -> Result<(Vec<PlatformListing>, ParseStats), AiError> {
    let body = strip_fences(raw);
    if !body.starts_with('{') || !body.ends_with('}') {
        return Err(AiError::Malformed("response is not a JSON object".to_string()));
    }

    let payload: Payload =
        serde_json::from_str(body).map_err(|e| AiError::Malformed(e.to_string()))?;

    let now = now_ns();
    let mut stats = ParseStats {
        total: payload.platforms.len(),
        ..ParseStats::default()
    };
    let mut listings = Vec::with_capacity(payload.platforms.len());

    for entry in payload.platforms {
        match parse_entry(entry, product_name, product_id, now) {
            Ok(listing) => {
                stats.accepted += 1;
                listings.push(listing);
            }
            Err(rejection) => match rejection {
                Rejection::Shape => stats.rejected_shape += 1,
                Rejection::EmptyPlatform | Rejection::UnknownPlatform => stats.rejected_platform += 1,
                Rejection::BadNumber => stats.rejected_numbers += 1,
                Rejection::MissingSeller => stats.rejected_seller += 1,
                Rejection::UnknownAvailability => stats.rejected_availability += 1,
            },
        }
    }

    if listings.is_empty() {
        return Err(AiError::NoValidEntries {
            rejected: stats.rejected(),
        });
    }
    Ok((listings, stats))
}

fn parse_entry(
    v: serde_json::Value,
    product_name: &str,
    product_id: i64,
    now: i64,
) -> Result<PlatformListing, Rejection> {
    let raw: RawEntry = serde_json::from_value(v).map_err(|_| Rejection::Shape)?;

    let name = raw.platform.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(Rejection::EmptyPlatform);
    }
    let platform = canonical_platform(&name).ok_or(Rejection::UnknownPlatform)?;

    let price = raw
        .price
        .as_ref()
        .and_then(Numeric::value)
        .filter(|p| *p > 0.0)
        .ok_or(Rejection::BadNumber)?;
    let rating = raw
        .rating
        .as_ref()
        .and_then(Numeric::value)
        .filter(|r| (0.0..=5.0).contains(r))
        .ok_or(Rejection::BadNumber)?;
    let review_count = match raw.review_count.as_ref() {
        None => 0,
        Some(n) => n
            .value()
            .filter(|c| *c >= 0.0 && *c <= f64::from(u32::MAX))
            .ok_or(Rejection::BadNumber)?
            .round() as u32,
    };

    let seller = raw.seller.unwrap_or_default();
    if seller.trim().is_empty() {
        return Err(Rejection::MissingSeller);
    }

    let availability = raw
        .availability
        .as_deref()
        .and_then(Availability::parse)
        .ok_or(Rejection::UnknownAvailability)?;

    Ok(PlatformListing {
        product_id,
        platform: platform.to_string(),
        price,
        rating,
        review_count,
        seller: seller.trim().to_string(),
        delivery_estimate: raw.delivery_time.unwrap_or_default(),
        return_policy: raw.return_policy.unwrap_or_default(),
        warranty: raw.warranty.unwrap_or_default(),
        offer_text: raw.offers.unwrap_or_default(),
        availability,
        product_link: search_url(platform, product_name),
        last_updated: now,
    })
}
