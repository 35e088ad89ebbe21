//! Number extraction from free text such as "₹79,900" or "4.5 out of 5 stars".

/// Scan the first decimal number, ignoring thousands separators inside it.
/// Returns the value and the text after the number.
fn scan(text: &str) -> Option<(f64, &str)> {
    let mut digits = String::new();
    let mut negative = false;
    let mut seen_dot = false;
    let mut end = text.len();

    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == ',' && !digits.is_empty() {
            continue;
        } else if c == '.' && !seen_dot && !digits.is_empty() {
            seen_dot = true;
            digits.push(c);
        } else if !digits.is_empty() {
            end = i;
            break;
        } else {
            negative = c == '-';
        }
    }

    let value = digits.trim_end_matches('.').parse::<f64>().ok()?;
    Some((if negative { -value } else { value }, &text[end..]))
}

/// First number in the text; anything after it is ignored.
pub fn first_number(text: &str) -> Option<f64> {
    scan(text).map(|(value, _)| value)
}

/// The one number in the text. Leading currency or labels are skipped, but a
/// second numeric run after it ("4.3/5") makes the text ambiguous.
pub fn sole_number(text: &str) -> Option<f64> {
    let (value, rest) = scan(text)?;
    if rest.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(value)
}
