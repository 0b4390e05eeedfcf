use std::str::FromStr;

pub fn text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_owned())
}

pub fn decimal(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            tracing::debug!(value = trimmed, "ignoring invalid decimal");
            None
        }
    }
}

pub fn boolean(raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return false;
    };
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

pub fn enumerated<T: FromStr>(raw: Option<&str>) -> Option<T> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::PublishStatus;

    #[test]
    fn text_trims_and_drops_blank() {
        assert_eq!(text(Some("  Kyoto ")).as_deref(), Some("Kyoto"));
        assert_eq!(text(Some("   ")), None);
        assert_eq!(text(None), None);
    }

    #[test]
    fn decimal_accepts_non_negative_numbers() {
        assert_eq!(decimal(Some(" 199.99 ")), Some(199.99));
        assert_eq!(decimal(Some("0")), Some(0.0));
        assert_eq!(decimal(Some("-5")), None);
        assert_eq!(decimal(Some("free")), None);
        assert_eq!(decimal(Some("NaN")), None);
        assert_eq!(decimal(Some("")), None);
    }

    #[test]
    fn boolean_recognizes_truthy_words() {
        for raw in ["true", "TRUE", " yes ", "1", "On"] {
            assert!(boolean(Some(raw)), "{raw} should be true");
        }
        for raw in ["false", "0", "no", "", "y"] {
            assert!(!boolean(Some(raw)), "{raw} should be false");
        }
        assert!(!boolean(None));
    }

    #[test]
    fn enumerated_rejects_unknown_values() {
        assert_eq!(
            enumerated::<PublishStatus>(Some(" public ")),
            Some(PublishStatus::Public)
        );
        assert_eq!(enumerated::<PublishStatus>(Some("archived")), None);
        assert_eq!(enumerated::<PublishStatus>(None), None);
    }
}
