//! Per-platform lookup tables for the free-text listing fields.

use rand::Rng;

use crate::types::Availability;

pub fn seller<R: Rng>(rng: &mut R, platform: &str) -> String {
    match platform {
        "Amazon" => {
            if rng.gen_bool(0.5) {
                "Amazon Retail".to_string()
            } else {
                "Cloudtail India".to_string()
            }
        }
        "Flipkart" => "Flipkart Assured".to_string(),
        "Myntra" => "Myntra Fashion Store".to_string(),
        "Meesho" => "Meesho Supplier".to_string(),
        "Ajio" => "AJIO Retail".to_string(),
        "Nykaa" => "Nykaa Fashion".to_string(),
        "Tata CLiQ" => "Tata CLiQ".to_string(),
        "FirstCry" => "FirstCry Store".to_string(),
        "Snapdeal" => "Snapdeal Seller".to_string(),
        "Shopify" => "Brand Official Store".to_string(),
        other => format!("{other} Official"),
    }
}

pub fn delivery_estimate<R: Rng>(rng: &mut R, platform: &str) -> String {
    match platform {
        "Amazon" => {
            if rng.gen_bool(0.5) {
                "1-2 days".to_string()
            } else {
                "2-3 days".to_string()
            }
        }
        "Flipkart" => "2-3 days".to_string(),
        "Meesho" => "3-5 days".to_string(),
        "Snapdeal" => "4-6 days".to_string(),
        _ => {
            let from = 2 + rng.gen_range(0..3);
            let to = 3 + rng.gen_range(0..3);
            format!("{}-{} days", from, to.max(from))
        }
    }
}

pub fn return_policy(platform: &str) -> &'static str {
    match platform {
        "Amazon" => "30 days return & refund",
        "Flipkart" | "Snapdeal" => "10 days return policy",
        "Myntra" | "Tata CLiQ" => "30 days easy return",
        "Nykaa" => "15 days return for sealed products",
        "Meesho" => "7 days return available",
        "FirstCry" => "15 days easy return",
        _ => "14 days return policy",
    }
}

pub fn warranty(product_name: &str) -> &'static str {
    let lower = product_name.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if any(&["iphone", "samsung", "laptop"]) {
        "1 year manufacturer warranty"
    } else if any(&["watch", "tv"]) {
        "1 year warranty + 1 year extended"
    } else if any(&["shirt", "shoe", "dress"]) {
        "No warranty (fashion item)"
    } else if any(&["lipstick", "cream"]) {
        "Authentic product guarantee"
    } else {
        "6 months warranty"
    }
}

const OFFERS: &[&str] = &[
    "Diwali Sale: Extra 10% off",
    "Festive Offer: Flat 15% discount",
    "Diwali Special: Buy 1 Get 1 Free",
    "Festival Deal: Up to 20% off",
    "Bank Offer: 10% instant discount",
    "Diwali Bonanza: No Cost EMI",
    "Festive Savings: Cashback ₹500",
    "Diwali Dhamaka: Extra 12% off",
    "Limited Time: Flat ₹1000 off",
    "Festival Special: 5% cashback",
];

pub fn offer<R: Rng>(rng: &mut R) -> String {
    OFFERS[rng.gen_range(0..OFFERS.len())].to_string()
}

/// 75 / 20 / 5 weighted draw.
pub fn availability<R: Rng>(rng: &mut R) -> Availability {
    match rng.gen_range(0..100) {
        0..=74 => Availability::InStock,
        75..=94 => Availability::LimitedStock,
        _ => Availability::OutOfStock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn warranty_follows_name_keywords() {
        assert_eq!(warranty("iPhone 15"), "1 year manufacturer warranty");
        assert_eq!(warranty("Fossil Watch"), "1 year warranty + 1 year extended");
        assert_eq!(warranty("Cotton Shirt"), "No warranty (fashion item)");
        assert_eq!(warranty("Matte Lipstick"), "Authentic product guarantee");
        assert_eq!(warranty("Bluetooth speaker"), "6 months warranty");
    }

    #[test]
    fn amazon_seller_is_one_of_two() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let s = seller(&mut rng, "Amazon");
            assert!(s == "Amazon Retail" || s == "Cloudtail India");
        }
        assert_eq!(seller(&mut rng, "Croma"), "Croma Official");
    }

    #[test]
    fn availability_weights_are_roughly_75_20_5() {
        let mut rng = StdRng::seed_from_u64(2024);
        let n = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            match availability(&mut rng) {
                Availability::InStock => counts[0] += 1,
                Availability::LimitedStock => counts[1] += 1,
                Availability::OutOfStock => counts[2] += 1,
            }
        }
        let share = |c: usize| c as f64 / n as f64;
        assert!((share(counts[0]) - 0.75).abs() < 0.02);
        assert!((share(counts[1]) - 0.20).abs() < 0.02);
        assert!((share(counts[2]) - 0.05).abs() < 0.01);
    }
}
