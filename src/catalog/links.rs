use super::canonical_platform;

/// Public search page for `product_name` on `platform`.
/// Unknown platforms fall back to a web search.
pub fn search_url(platform: &str, product_name: &str) -> String {
    let q = product_name.trim().to_lowercase().replace(' ', "+");
    match canonical_platform(platform) {
        Some("Amazon") => format!("https://www.amazon.in/s?k={q}"),
        Some("Flipkart") => format!("https://www.flipkart.com/search?q={q}"),
        Some("Myntra") => format!("https://www.myntra.com/{q}"),
        Some("Meesho") => format!("https://www.meesho.com/search?q={q}"),
        Some("Ajio") => format!("https://www.ajio.com/search?query={q}"),
        Some("Snapdeal") => format!("https://www.snapdeal.com/search?keyword={q}"),
        Some("Nykaa") => format!("https://www.nykaa.com/search/result/?q={q}"),
        Some("Tata CLiQ") => format!("https://www.tatacliq.com/search/?searchCategory=all&text={q}"),
        Some("FirstCry") => format!("https://www.firstcry.com/search?q={q}"),
        Some("Shopify") => format!("https://shop.app/search?query={q}"),
        _ => format!("https://www.google.com/search?q={q}"),
    }
}

/// Platform whose host serves a stored product URL, if any.
pub fn platform_from_url(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    let after_scheme = lower.split_once("://").map_or(lower.as_str(), |(_, rest)| rest);
    let host = after_scheme.split(['/', '?', '#']).next().unwrap_or_default();
    const HOSTS: &[(&str, &str)] = &[
        ("amazon", "Amazon"),
        ("flipkart", "Flipkart"),
        ("myntra", "Myntra"),
        ("meesho", "Meesho"),
        ("ajio", "Ajio"),
        ("snapdeal", "Snapdeal"),
        ("nykaa", "Nykaa"),
        ("tatacliq", "Tata CLiQ"),
        ("tata", "Tata CLiQ"),
        ("firstcry", "FirstCry"),
        ("shopify", "Shopify"),
    ];
    HOSTS
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, platform)| *platform)
}

/// Synthetic source URL used as the dedup identity for products added by name.
pub fn name_source_url(product_name: &str) -> String {
    format!("https://search/{}", product_name.trim().to_lowercase().replace(' ', "+"))
}
