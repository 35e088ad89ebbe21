pub mod classifier;
pub mod links;

pub use classifier::{classify, relevant_platforms};
pub use links::{platform_from_url, search_url};

/// Every platform the pipeline knows about, in canonical spelling.
pub const ALL_PLATFORMS: &[&str] = &[
    "Amazon", "Flipkart", "Myntra", "Meesho", "Ajio", "Snapdeal", "Nykaa", "Tata CLiQ", "FirstCry",
    "Shopify",
];

/// Case-insensitive lookup returning the canonical platform name.
/// Whitespace inside the name is ignored, so "tatacliq" matches "Tata CLiQ".
pub fn canonical_platform(name: &str) -> Option<&'static str> {
    let wanted = squash(name);
    if wanted.is_empty() {
        return None;
    }
    ALL_PLATFORMS.iter().copied().find(|p| squash(p) == wanted)
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
