//! Email draft links (`mailto:` URI).

pub const INQUIRY_SUBJECT: &str = "Roofing Inquiry";

/// Build a `mailto:` link with subject and body prefilled. Returns `None` for
/// anything that does not look like an address.
pub fn compose_link(address: &str, message: &str) -> Option<String> {
    let address = address.trim();
    let (local, domain) = address.split_once('@')?;
    if local.is_empty() || domain.is_empty() || address.chars().any(char::is_whitespace) {
        return None;
    }
    Some(format!(
        "mailto:{address}?subject={}&body={}",
        urlencoding::encode(INQUIRY_SUBJECT),
        urlencoding::encode(message)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_link() {
        assert_eq!(
            compose_link("quotes@roofer.example", "Hello & thanks").as_deref(),
            Some("mailto:quotes@roofer.example?subject=Roofing%20Inquiry&body=Hello%20%26%20thanks")
        );
    }

    #[test]
    fn test_rejects_non_addresses() {
        assert_eq!(compose_link("", "x"), None);
        assert_eq!(compose_link("roofer.example", "x"), None);
        assert_eq!(compose_link("@roofer.example", "x"), None);
        assert_eq!(compose_link("a b@roofer.example", "x"), None);
    }
}
