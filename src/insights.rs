//! Buying recommendation over a product's stored listings.

use serde::Serialize;
use tracing::warn;

use crate::ai::AiProvider;
use crate::types::PlatformListing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Ai,
    Rules,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    pub best_price_platform: String,
    pub best_price: f64,
    pub best_rated_platform: String,
    pub best_rating: f64,
    pub advice: String,
    pub source: AdviceSource,
}

/// Cheapest and best-rated listings plus a short advice line.
/// `None` for an empty slice.
pub fn rule_based(listings: &[PlatformListing]) -> Option<Recommendation> {
    let cheapest = listings.iter().min_by(|a, b| a.price.total_cmp(&b.price))?;
    let top = listings.iter().max_by(|a, b| a.rating.total_cmp(&b.rating))?;

    let advice = if cheapest.platform == top.platform {
        format!("Buy from {}: best price and top rated.", cheapest.platform)
    } else {
        let extra = top.price - cheapest.price;
        let extra_pct = extra / cheapest.price * 100.0;
        if extra_pct < 10.0 {
            format!(
                "Consider {} ({:.1} stars) for ₹{:.2} more than {}.",
                top.platform, top.rating, extra, cheapest.platform
            )
        } else {
            format!(
                "Go with {} at ₹{:.2} if price is your priority.",
                cheapest.platform, cheapest.price
            )
        }
    };

    Some(Recommendation {
        best_price_platform: cheapest.platform.clone(),
        best_price: cheapest.price,
        best_rated_platform: top.platform.clone(),
        best_rating: top.rating,
        advice,
        source: AdviceSource::Rules,
    })
}

/// Rule-based picks, with the advice text replaced by the model's when it answers.
pub async fn recommend(ai: &AiProvider, listings: &[PlatformListing]) -> Option<Recommendation> {
    let mut rec = rule_based(listings)?;
    if !ai.is_configured() {
        return Some(rec);
    }
    match ai.advise(listings).await {
        Ok(text) => {
            rec.advice = text.trim().to_string();
            rec.source = AdviceSource::Ai;
        }
        Err(e) => warn!("AI advice unavailable, using rules: {e}"),
    }
    Some(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::tests::ScriptedGenerator;
    use crate::ai::TextGenerator;
    use crate::db::store::tests::listing;
    use crate::error::AiError;
    use std::sync::Arc;

    fn priced(platform: &str, price: f64, rating: f64) -> PlatformListing {
        let mut l = listing(1, platform, price);
        l.rating = rating;
        l
    }

    #[test]
    fn same_platform_wins_both() {
        let rec = rule_based(&[priced("Amazon", 100.0, 4.8), priced("Meesho", 120.0, 3.9)]).unwrap();
        assert_eq!(rec.best_price_platform, "Amazon");
        assert_eq!(rec.best_rated_platform, "Amazon");
        assert!(rec.advice.contains("best price and top rated"));
    }

    #[test]
    fn small_premium_suggests_better_rated() {
        let rec = rule_based(&[priced("Meesho", 100.0, 3.9), priced("Amazon", 105.0, 4.7)]).unwrap();
        assert!(rec.advice.starts_with("Consider Amazon"));
    }

    #[test]
    fn large_premium_suggests_cheapest() {
        let rec = rule_based(&[priced("Meesho", 100.0, 3.9), priced("Amazon", 130.0, 4.7)]).unwrap();
        assert!(rec.advice.starts_with("Go with Meesho"));
    }

    #[test]
    fn empty_listings_give_nothing() {
        assert!(rule_based(&[]).is_none());
    }

    #[tokio::test]
    async fn ai_failure_falls_back_to_rules() {
        let generator: Arc<dyn TextGenerator> =
            Arc::new(ScriptedGenerator::new(vec![Err(AiError::Transport("down".into()))]));
        let ai = AiProvider::new(Some(generator));
        let rec = recommend(&ai, &[priced("Amazon", 100.0, 4.5)]).await.unwrap();
        assert_eq!(rec.source, AdviceSource::Rules);
    }

    #[tokio::test]
    async fn ai_advice_replaces_text() {
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::new(vec![Ok(
            "**Recommended Platform:** Amazon\n".to_string(),
        )]));
        let ai = AiProvider::new(Some(generator));
        let rec = recommend(&ai, &[priced("Amazon", 100.0, 4.5)]).await.unwrap();
        assert_eq!(rec.source, AdviceSource::Ai);
        assert_eq!(rec.advice, "**Recommended Platform:** Amazon");
    }
}
