//! WhatsApp click-to-chat links.

const CHAT_BASE_URL: &str = "https://wa.me";

/// wa.me only accepts the international number as bare digits.
pub fn normalize_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Build a chat deep link with `message` prefilled.
pub fn chat_link(number: &str, message: &str) -> Option<String> {
    let number = normalize_number(number)?;
    Some(format!(
        "{CHAT_BASE_URL}/{number}?text={}",
        urlencoding::encode(message)
    ))
}
