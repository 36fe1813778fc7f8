//! Phone number normalization to E.164 digits

use regex::Regex;

/// Normalize a phone number to E.164 digits without the leading `+`.
///
/// Numbers written with `+` or `00` keep their country code; anything else
/// is treated as national and prefixed with `default_country_code` after
/// dropping a single trunk `0`. Returns `None` unless 8 to 15 digits remain.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let separators = Regex::new(r"[\s().\-/]").ok()?;
    let cleaned = separators.replace_all(raw.trim(), "");

    let digits = if let Some(rest) = cleaned.strip_prefix('+') {
        rest.to_string()
    } else if let Some(rest) = cleaned.strip_prefix("00") {
        rest.to_string()
    } else {
        let national = cleaned.strip_prefix('0').unwrap_or(&cleaned);
        format!("{}{}", default_country_code.trim_start_matches('+'), national)
    };

    let valid = Regex::new(r"^[1-9]\d{7,14}$").ok()?;
    valid.is_match(&digits).then_some(digits)
}
