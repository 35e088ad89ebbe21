//! Base price estimation and per-platform numeric distributions.

use rand::Rng;

/// Exact-match anchors for flagship phones, checked before any range.
/// Longer names come first so "iphone 15 pro" is not caught by "iphone 15".
const ANCHORS: &[(&str, f64)] = &[
    ("iphone 16", 89_900.0),
    ("iphone 15 pro", 134_900.0),
    ("iphone 15", 79_900.0),
    ("iphone 14", 69_900.0),
    ("iphone 13", 59_900.0),
    ("samsung s24 ultra", 124_999.0),
    ("samsung s24", 74_999.0),
    ("samsung s23", 64_999.0),
    ("oneplus 12", 64_999.0),
    ("oneplus 11", 56_999.0),
    ("pixel 8", 75_999.0),
];

/// (keywords, floor, width): base = floor + r * width.
const RANGES: &[(&[&str], f64, f64)] = &[
    // electronics
    (&["macbook"], 95_000.0, 100_000.0),
    (&["laptop"], 50_000.0, 50_000.0),
    (&["airpods"], 12_000.0, 12_000.0),
    (&["smartwatch", "watch"], 5_000.0, 20_000.0),
    (&["television", "tv"], 25_000.0, 75_000.0),
    (&["tablet", "ipad"], 25_000.0, 75_000.0),
    // fashion
    (&["nike", "adidas"], 3_000.0, 7_000.0),
    (&["shoe", "sneaker"], 2_000.0, 8_000.0),
    (&["shirt", "tshirt"], 400.0, 1_600.0),
    (&["jeans", "pants"], 800.0, 2_200.0),
    (&["dress"], 1_000.0, 4_000.0),
    (&["saree"], 1_500.0, 8_500.0),
    // beauty
    (&["lipstick"], 300.0, 1_700.0),
    (&["perfume"], 1_500.0, 8_500.0),
    (&["skincare"], 500.0, 2_500.0),
    // baby
    (&["diaper"], 800.0, 1_200.0),
    (&["baby"], 500.0, 4_500.0),
];

const DEFAULT_RANGE: (f64, f64) = (1_000.0, 9_000.0);

pub fn estimate_base_price<R: Rng>(rng: &mut R, product_name: &str) -> f64 {
    let lower = product_name.to_lowercase();

    if let Some((_, anchor)) = ANCHORS.iter().find(|(k, _)| lower.contains(k)) {
        return *anchor;
    }

    let (floor, width) = RANGES
        .iter()
        .find(|(keys, _, _)| keys.iter().any(|k| lower.contains(k)))
        .map(|(_, f, w)| (*f, *w))
        .unwrap_or(DEFAULT_RANGE);
    floor + rng.gen::<f64>() * width
}

/// (floor, width) of the multiplicative price adjustment for a platform.
pub fn platform_multiplier_range(platform: &str) -> (f64, f64) {
    match platform {
        "Meesho" => (0.75, 0.10),
        "Snapdeal" => (0.82, 0.12),
        "Amazon" => (0.95, 0.10),
        "Flipkart" => (0.93, 0.12),
        "Myntra" => (0.97, 0.08),
        "Tata CLiQ" => (0.98, 0.07),
        "Nykaa" => (0.96, 0.09),
        "Ajio" => (0.94, 0.11),
        "FirstCry" => (0.92, 0.13),
        "Shopify" => (0.90, 0.15),
        _ => (0.95, 0.10),
    }
}

pub fn platform_price<R: Rng>(rng: &mut R, base: f64, platform: &str) -> f64 {
    let (floor, width) = platform_multiplier_range(platform);
    round_to(base * (floor + rng.gen::<f64>() * width), 2)
}

pub fn rating<R: Rng>(rng: &mut R, platform: &str) -> f64 {
    let (floor, width) = match platform {
        "Amazon" | "Flipkart" => (4.0, 0.8),
        "Myntra" | "Tata CLiQ" | "Nykaa" => (3.8, 1.0),
        "Meesho" | "Snapdeal" => (3.5, 1.2),
        _ => (3.7, 1.0),
    };
    round_to(floor + rng.gen::<f64>() * width, 1).clamp(3.0, 5.0)
}

pub fn review_count<R: Rng>(rng: &mut R, platform: &str) -> u32 {
    let (floor, spread) = match platform {
        "Amazon" => (1_000, 10_000),
        "Flipkart" => (500, 8_000),
        "Myntra" => (200, 3_000),
        "Meesho" => (100, 2_000),
        "Nykaa" => (150, 2_500),
        _ => (50, 1_500),
    };
    floor + rng.gen_range(0..spread)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn anchors_win_over_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(estimate_base_price(&mut rng, "Apple iPhone 15"), 79_900.0);
        assert_eq!(estimate_base_price(&mut rng, "iPhone 15 Pro Max"), 134_900.0);
        assert_eq!(estimate_base_price(&mut rng, "Samsung S24 Ultra 512GB"), 124_999.0);
    }

    #[test]
    fn ranges_and_default_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = estimate_base_price(&mut rng, "Dell laptop");
            assert!((50_000.0..=100_000.0).contains(&p));
            let p = estimate_base_price(&mut rng, "Maybelline lipstick");
            assert!((300.0..=2_000.0).contains(&p));
            let p = estimate_base_price(&mut rng, "mystery gadget");
            assert!((1_000.0..=10_000.0).contains(&p));
        }
    }

    #[test]
    fn ratings_stay_within_three_to_five() {
        let mut rng = StdRng::seed_from_u64(99);
        for platform in ["Amazon", "Meesho", "Nykaa", "Shopify", "Unknown"] {
            for _ in 0..200 {
                let r = rating(&mut rng, platform);
                assert!((3.0..=5.0).contains(&r), "{platform} gave {r}");
            }
        }
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(123.456, 2), 123.46);
        assert_eq!(round_to(4.25, 1), 4.3);
    }
}
