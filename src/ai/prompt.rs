use crate::types::PlatformListing;

/// Instruction for a full multi-platform listing set as JSON.
pub fn listing_prompt(product_name: &str, platforms: &[String]) -> String {
    format!(
        r#"You are an expert Indian e-commerce pricing analyst with current market knowledge.

TASK: Provide realistic product comparison data for: "{product_name}"

PLATFORMS TO ANALYZE: {platforms}

RESPONSE FORMAT (JSON ONLY, NO OTHER TEXT):
{{
  "platforms": [
    {{
      "platform": "Platform Name",
      "price": <realistic INR price>,
      "rating": <3.0 to 5.0>,
      "reviewCount": <realistic number>,
      "seller": "<official seller name>",
      "deliveryTime": "<X-Y days>",
      "returnPolicy": "<platform policy>",
      "warranty": "<warranty details>",
      "offers": "<current offer>",
      "availability": "<In Stock | Limited Stock | Out of Stock>"
    }}
  ]
}}

CRITICAL PRICING RULES:
1. Base prices on current Indian market rates
2. Prices must vary 5-15% across platforms (realistic competition)
3. Meesho: 15-25% cheaper (budget platform)
4. Amazon/Flipkart: Market average
5. Tata CLiQ: 3-8% premium (premium platform)
6. Include any running festival or bank offers

REALISTIC CONSTRAINTS:
- Ratings: Not all 4.5+, use realistic distribution
- Reviews: Vary by platform popularity (Amazon highest)
- Availability: 75% in stock, 20% limited, 5% out of stock
- Include ONLY platforms that actually sell this product category

EXAMPLE (for reference):
iPhone 15 would be: Amazon ₹79,900, Flipkart ₹79,999, Meesho ₹67,500

Respond ONLY with valid JSON. No explanations, no markdown, just JSON."#,
        platforms = platforms.join(", "),
    )
}

/// Instruction for a buying recommendation over stored listings.
pub fn advice_prompt(listings: &[PlatformListing]) -> String {
    let mut prompt = String::from(
        "Analyze the following product comparison data from different e-commerce platforms \
         and recommend the best platform to buy from. Consider price, rating, delivery time, \
         return policy, warranty, and offers.\n\n",
    );

    for l in listings {
        prompt.push_str(&format!(
            "Platform: {}\nPrice: ₹{:.2}\nRating: {:.1}/5\nSeller: {}\nDelivery: {}\n\
             Return Policy: {}\nWarranty: {}\nOffers: {}\n\n",
            l.platform,
            l.price,
            l.rating,
            l.seller,
            l.delivery_estimate,
            l.return_policy,
            l.warranty,
            l.offer_text,
        ));
    }

    prompt.push_str(
        "Provide a recommendation in this format:\n\
         **Recommended Platform:** [Platform Name]\n\n\
         **Reasons:**\n1. [First reason]\n2. [Second reason]\n3. [Third reason]\n\n\
         **Overall Value Score:** [Score out of 10]",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_prompt_names_product_and_platforms() {
        let p = listing_prompt("Pixel 8", &["Amazon".to_string(), "Tata CLiQ".to_string()]);
        assert!(p.contains("\"Pixel 8\""));
        assert!(p.contains("PLATFORMS TO ANALYZE: Amazon, Tata CLiQ"));
        assert!(p.contains("\"reviewCount\""));
        assert!(p.contains("75% in stock"));
    }
}
