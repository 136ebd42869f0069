//! SMS compose links (`sms:` URI).

/// Build an `sms:` link with the body prefilled. The `?&body=` form is the one
/// both iOS and Android message apps accept.
pub fn compose_link(phone: &str, message: &str) -> Option<String> {
    let phone: String = phone
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '+')
        .collect();
    if phone.trim_start_matches('+').is_empty() {
        return None;
    }
    Some(format!("sms:{phone}?&body={}", urlencoding::encode(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_link() {
        assert_eq!(
            compose_link("9987412299", "Roof leak\nPlease call").as_deref(),
            Some("sms:9987412299?&body=Roof%20leak%0APlease%20call")
        );
    }

    #[test]
    fn test_keeps_international_prefix() {
        assert_eq!(
            compose_link("+44 20 7946 0958", "x").as_deref(),
            Some("sms:+442079460958?&body=x")
        );
    }

    #[test]
    fn test_rejects_empty_number() {
        assert_eq!(compose_link("", "x"), None);
        assert_eq!(compose_link("+", "x"), None);
    }
}
