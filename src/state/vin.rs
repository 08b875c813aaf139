/// VIN suffix extraction and input validation
///
/// Only the last 6 characters of a VIN are tracked. Filenames often already
/// contain them (`VIN-B1024-AB12C3.jpg`, `DONE_XY34Z9_front.jpg`), so the
/// extractor offers a candidate that pre-fills the operator's input.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// Length of the tracked VIN suffix
pub const VIN_LEN: usize = 6;

/// Filename prefix marking an already-processed image
pub const DONE_PREFIX: &str = "DONE_";

static VIN_TAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:VIN)[_-]([A-Za-z0-9]{6})").expect("VIN tag regex is valid")
});

static DONE_TAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:DONE)_([A-Za-z0-9]{6})_").expect("DONE tag regex is valid")
});

static ANY_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9]{6}").expect("alphanumeric run regex is valid")
});

/// Derive a candidate VIN suffix from a filename.
///
/// Priority order, first match wins:
/// 1. `VIN_xxxxxx` / `VIN-xxxxxx` (any case)
/// 2. `DONE_xxxxxx_`
/// 3. the first six consecutive alphanumerics anywhere in the name
///
/// The result is always uppercased. Pure: the same filename always yields
/// the same candidate.
pub fn extract_vin(filename: &str) -> Option<String> {
    let tagged = VIN_TAGGED
        .captures(filename)
        .or_else(|| DONE_TAGGED.captures(filename))
        .and_then(|caps| caps.get(1));

    if let Some(m) = tagged {
        return Some(m.as_str().to_ascii_uppercase());
    }

    ANY_RUN.find(filename).map(|m| m.as_str().to_ascii_uppercase())
}

/// Trim and uppercase raw operator input
pub fn normalize_vin(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Normalize and validate operator input, returning the VIN to submit
pub fn validate_vin(input: &str) -> Result<String, ValidationError> {
    let vin = normalize_vin(input);

    if vin.is_empty() {
        return Err(ValidationError::Empty);
    }

    let well_formed = vin.len() == VIN_LEN
        && vin.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if !well_formed {
        return Err(ValidationError::Malformed);
    }

    Ok(vin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vin_tag_wins() {
        assert_eq!(extract_vin("car_VIN-AB12C3.jpg").as_deref(), Some("AB12C3"));
        assert_eq!(extract_vin("vin_ab12c3.jpg").as_deref(), Some("AB12C3"));
        // VIN tag beats an earlier generic run
        assert_eq!(extract_vin("PHOTO123_VIN_QQ99ZZ.png").as_deref(), Some("QQ99ZZ"));
    }

    #[test]
    fn test_done_prefix() {
        assert_eq!(extract_vin("DONE_XY34Z9_front.jpg").as_deref(), Some("XY34Z9"));
        assert_eq!(extract_vin("done_xy34z9_rear.jpg").as_deref(), Some("XY34Z9"));
    }

    #[test]
    fn test_first_run_of_six() {
        assert_eq!(extract_vin("img001.jpg").as_deref(), Some("IMG001"));
        assert_eq!(extract_vin("a-b-583696.jpeg").as_deref(), Some("583696"));
        // Longer runs contribute their leading six characters
        assert_eq!(extract_vin("abcdefgh.jpg").as_deref(), Some("ABCDEF"));
    }

    #[test]
    fn test_no_candidate() {
        assert_eq!(extract_vin("img01.jpg"), None);
        assert_eq!(extract_vin("a_b_c.png"), None);
        assert_eq!(extract_vin(""), None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        for name in ["car_VIN-AB12C3.jpg", "DONE_XY34Z9_front.jpg", "img01.jpg", "x.jpg"] {
            assert_eq!(extract_vin(name), extract_vin(name));
        }
    }

    #[test]
    fn test_validate_normalizes() {
        assert_eq!(validate_vin("  ab12c3 "), Ok("AB12C3".to_string()));
    }

    #[test]
    fn test_validate_rejects() {
        assert_eq!(validate_vin("   "), Err(ValidationError::Empty));
        assert_eq!(validate_vin("AB12C"), Err(ValidationError::Malformed));
        assert_eq!(validate_vin("AB12C34"), Err(ValidationError::Malformed));
        assert_eq!(validate_vin("AB-2C3"), Err(ValidationError::Malformed));
        assert_eq!(validate_vin("ÄB12C3"), Err(ValidationError::Malformed));
    }
}
