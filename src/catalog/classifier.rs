//! Keyword classification of product names into shopping categories.
//! Each category maps to the ordered platform list that actually sells it,
//! which bounds the AI prompt and the synthetic set.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCategory {
    Beauty,
    BabyKids,
    Fashion,
    Footwear,
    /// Default bucket for anything unmatched.
    Electronics,
}

const BEAUTY: &[&str] = &["lipstick", "makeup", "skincare", "cosmetic", "beauty", "nail polish"];
const BABY_KIDS: &[&str] = &["baby", "diaper", "kids", "toy", "infant", "newborn"];
const FASHION: &[&str] = &["shirt", "dress", "jeans", "shoe", "saree", "kurta", "t-shirt", "clothing"];
const FOOTWEAR: &[&str] = &["sneaker", "sandal", "boot", "footwear"];

/// First matching category wins; order is beauty, baby/kids, fashion, footwear.
pub fn classify(product_name: &str) -> ProductCategory {
    let lower = product_name.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if hit(BEAUTY) {
        ProductCategory::Beauty
    } else if hit(BABY_KIDS) {
        ProductCategory::BabyKids
    } else if hit(FASHION) {
        ProductCategory::Fashion
    } else if hit(FOOTWEAR) {
        ProductCategory::Footwear
    } else {
        ProductCategory::Electronics
    }
}

impl ProductCategory {
    pub fn platforms(self) -> &'static [&'static str] {
        match self {
            ProductCategory::Beauty => &["Amazon", "Flipkart", "Myntra", "Nykaa", "Tata CLiQ", "Meesho"],
            ProductCategory::BabyKids => &["Amazon", "Flipkart", "FirstCry", "Meesho", "Shopify"],
            ProductCategory::Fashion => &["Amazon", "Flipkart", "Myntra", "Ajio", "Meesho", "Tata CLiQ"],
            ProductCategory::Footwear => &["Amazon", "Flipkart", "Myntra", "Ajio", "Meesho"],
            ProductCategory::Electronics => {
                &["Amazon", "Flipkart", "Tata CLiQ", "Shopify", "Snapdeal", "Meesho"]
            }
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductCategory::Beauty => "beauty",
            ProductCategory::BabyKids => "baby_kids",
            ProductCategory::Fashion => "fashion",
            ProductCategory::Footwear => "footwear",
            ProductCategory::Electronics => "electronics",
        };
        write!(f, "{s}")
    }
}

pub fn relevant_platforms(product_name: &str) -> Vec<String> {
    classify(product_name)
        .platforms()
        .iter()
        .map(|p| p.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_names_are_electronics() {
        assert_eq!(classify("iPhone 15"), ProductCategory::Electronics);
        assert_eq!(classify(""), ProductCategory::Electronics);
    }

    #[test]
    fn beauty_checked_before_baby() {
        // "baby lipstick" hits both lists; beauty wins.
        assert_eq!(classify("Baby Lipstick Set"), ProductCategory::Beauty);
        assert_eq!(classify("Pampers Diaper Pack"), ProductCategory::BabyKids);
    }

    #[test]
    fn fashion_and_footwear() {
        assert_eq!(classify("Levi's Jeans 511"), ProductCategory::Fashion);
        assert_eq!(classify("Nike Running Sneaker"), ProductCategory::Footwear);
        // "shoe" is a fashion keyword and fashion is checked first.
        assert_eq!(classify("Running Shoe"), ProductCategory::Fashion);
    }

    #[test]
    fn baby_products_never_land_on_cosmetics_platform() {
        let platforms = relevant_platforms("newborn baby wipes");
        assert!(!platforms.iter().any(|p| p == "Nykaa"));
        assert!(platforms.iter().any(|p| p == "FirstCry"));
    }

    #[test]
    fn category_labels_for_logging() {
        assert_eq!(classify("baby diaper").to_string(), "baby_kids");
        assert_eq!(classify("Galaxy S24").to_string(), "electronics");
    }

    #[test]
    fn every_category_lists_known_platforms() {
        for cat in [
            ProductCategory::Beauty,
            ProductCategory::BabyKids,
            ProductCategory::Fashion,
            ProductCategory::Footwear,
            ProductCategory::Electronics,
        ] {
            for p in cat.platforms() {
                assert_eq!(super::super::canonical_platform(p), Some(*p));
            }
        }
    }
}
