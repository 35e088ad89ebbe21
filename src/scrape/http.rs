//! Plain-HTTP engine: fetch the search page, read the first result card.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::info;

use super::PageScraper;
use crate::catalog::search_url;
use crate::config::{SCRAPE_REQUEST_DELAY, SCRAPE_TIMEOUT};
use crate::error::{AppError, Result};
use crate::numeric::first_number;
use crate::types::{now_ns, Availability, PlatformListing};

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// CSS selectors and fixed texts for one platform's result page.
struct Layout {
    /// Tried in order; the first selector that matches anything wins.
    cards: &'static [&'static str],
    price: &'static str,
    rating: &'static str,
    reviews: Option<&'static str>,
    seller: &'static str,
    delivery: &'static str,
    returns: &'static str,
}

const FLIPKART: Layout = Layout {
    cards: &["div[data-id]", "div._1AtVbE", "div.cPHDOP"],
    price: "div._30jeq3, div._3I9_wc",
    rating: "div._3LWZlK",
    reviews: Some("span._2_R_DZ"),
    seller: "div._2WkVRV",
    delivery: "Check website",
    returns: "10 days return policy",
};

const AMAZON: Layout = Layout {
    cards: &["div[data-component-type='s-search-result']"],
    price: "span.a-price-whole",
    rating: "span.a-icon-alt",
    reviews: None,
    seller: "span.a-size-base",
    delivery: "2-3 days",
    returns: "30 days return",
};

fn layout_for(platform: &str) -> Option<&'static Layout> {
    match platform {
        "Flipkart" => Some(&FLIPKART),
        "Amazon" => Some(&AMAZON),
        _ => None,
    }
}

pub struct HttpListingScraper {
    client: Client,
    delay: Duration,
}

impl HttpListingScraper {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(SCRAPE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            delay: SCRAPE_REQUEST_DELAY,
        })
    }
}

#[async_trait]
impl PageScraper for HttpListingScraper {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn scrape(&self, platform: &str, product_name: &str, product_id: i64) -> Result<PlatformListing> {
        if layout_for(platform).is_none() {
            return Err(AppError::Scrape(format!("no page layout for {platform}")));
        }

        tokio::time::sleep(self.delay).await;

        let url = search_url(platform, product_name);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::Scrape(format!("{platform} returned HTTP {}", resp.status())));
        }
        let body = resp.text().await?;

        let listing = parse_result_page(platform, &body, &url, product_id)?;
        info!(platform, price = listing.price, "[SCRAPE] {platform} listing found");
        Ok(listing)
    }
}

/// Read the first result card of a search page into a listing.
pub fn parse_result_page(platform: &str, body: &str, url: &str, product_id: i64) -> Result<PlatformListing> {
    let layout =
        layout_for(platform).ok_or_else(|| AppError::Scrape(format!("no page layout for {platform}")))?;
    let html = Html::parse_document(body);

    let mut card = None;
    for sel in layout.cards {
        if let Some(first) = html.select(&selector(sel)?).next() {
            card = Some(first);
            break;
        }
    }
    let card = card.ok_or_else(|| AppError::Scrape(format!("no result cards on {platform} page")))?;

    let price = text_in(&card, layout.price)?
        .and_then(|t| first_number(&t))
        .filter(|p| *p > 0.0)
        .ok_or_else(|| AppError::Scrape(format!("no price in first {platform} result")))?;
    let rating = text_in(&card, layout.rating)?
        .and_then(|t| first_number(&t))
        .filter(|r| (0.0..=5.0).contains(r))
        .unwrap_or(0.0);
    let review_count = match layout.reviews {
        Some(sel) => text_in(&card, sel)?
            .and_then(|t| first_number(&t))
            .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map_or(0, |n| n as u32),
        None => 0,
    };
    let seller = text_in(&card, layout.seller)?.unwrap_or_else(|| "N/A".to_string());

    Ok(PlatformListing {
        product_id,
        platform: platform.to_string(),
        price,
        rating,
        review_count,
        seller,
        delivery_estimate: layout.delivery.to_string(),
        return_policy: layout.returns.to_string(),
        warranty: String::new(),
        offer_text: String::new(),
        availability: Availability::InStock,
        product_link: url.to_string(),
        last_updated: now_ns(),
    })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Scrape(format!("invalid selector '{css}': {e:?}")))
}

fn text_in(card: &ElementRef, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(card
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty()))
}
