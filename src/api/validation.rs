use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::error::ApiError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const MAX_NAME_LENGTH: usize = 255;

const PRICE_MAX_DIGITS: usize = 5;
const PRICE_DECIMAL_PLACES: u32 = 2;

/// Collects per-field messages so every problem in a payload is reported at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Record the error, if any, and pass the value through
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid input", Some(self.errors)))
        }
    }
}

/// Deserialize a field so that absent (`None`) differs from `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub fn required<T>(value: Option<T>) -> Result<T, String> {
    value.ok_or_else(|| REQUIRED.to_string())
}

/// Trimmed, non-blank text no longer than `max` characters
pub fn text(value: &str, max: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BLANK.to_string());
    }
    if trimmed.chars().count() > max {
        return Err(format!("Ensure this field has no more than {} characters.", max));
    }
    Ok(trimmed.to_string())
}

pub fn required_text(value: Option<&str>, max: usize) -> Result<String, String> {
    text(required(value)?, max)
}

/// Passwords are never trimmed
pub fn password(value: &str, min: usize) -> Result<String, String> {
    if value.is_empty() {
        return Err(BLANK.to_string());
    }
    if value.chars().count() < min {
        return Err(format!("Ensure this field has at least {} characters.", min));
    }
    Ok(value.to_string())
}

pub fn email(value: &str) -> Result<String, String> {
    let value = text(value, MAX_NAME_LENGTH)?;
    match value.rsplit_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace) =>
        {
            Ok(value)
        }
        _ => Err("Enter a valid email address.".to_string()),
    }
}

pub fn non_negative(value: i64) -> Result<i32, String> {
    if value < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    i32::try_from(value).map_err(|_| format!("Ensure this value is less than or equal to {}.", i32::MAX))
}

fn digit_count(value: Decimal) -> usize {
    value.mantissa().unsigned_abs().to_string().len()
}

/// Non-negative price fitting NUMERIC(5, 2), rescaled to two decimal places.
/// With two decimal places the five-digit total leaves three whole digits.
pub fn price(value: Decimal) -> Result<Decimal, String> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    let normalized = value.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        ));
    }

    let whole_digits = PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES as usize;
    let integer_part = normalized.trunc();
    if !integer_part.is_zero() && digit_count(integer_part.normalize()) > whole_digits {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            whole_digits
        ));
    }

    let mut price = normalized.abs();
    price.rescale(PRICE_DECIMAL_PLACES);
    Ok(price)
}

/// Optional link; blank collapses to `None`
pub fn link(value: Option<String>) -> Result<Option<String>, String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(link) if link.chars().count() > MAX_NAME_LENGTH => Err(format!(
            "Ensure this field has no more than {} characters.",
            MAX_NAME_LENGTH
        )),
        Some(link) => Ok(Some(link.to_string())),
    }
}

/// Sorted, duplicate-free id list
pub fn id_set(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(text("  Vegan ", 255).unwrap(), "Vegan");
        assert_eq!(text("   ", 255).unwrap_err(), BLANK);
        assert!(text(&"a".repeat(256), 255).is_err());
        assert_eq!(required_text(None, 255).unwrap_err(), REQUIRED);
    }

    #[test]
    fn password_enforces_minimum_length() {
        assert!(password("pw", 5).is_err());
        assert_eq!(password(" pass ", 5).unwrap(), " pass ");
    }

    #[test]
    fn email_needs_local_part_and_domain() {
        assert!(email("test@example.com").is_ok());
        assert!(email("test").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("test@").is_err());
    }

    #[test]
    fn time_must_not_be_negative() {
        assert_eq!(non_negative(0).unwrap(), 0);
        assert!(non_negative(-1).is_err());
        assert!(non_negative(i64::from(i32::MAX) + 1).is_err());
    }

    #[test]
    fn price_is_rescaled_to_two_places() {
        assert_eq!(price(dec("5")).unwrap().to_string(), "5.00");
        assert_eq!(price(dec("5.5")).unwrap().to_string(), "5.50");
        assert_eq!(price(dec("999.99")).unwrap().to_string(), "999.99");
        assert_eq!(price(dec("0")).unwrap().to_string(), "0.00");
    }

    #[test]
    fn price_rejects_out_of_range_values() {
        assert!(price(dec("-1.00")).is_err());
        assert!(price(dec("1.234")).is_err());
        assert!(price(dec("1000")).is_err());
        assert!(price(dec("1000.5")).is_err());
    }

    #[test]
    fn blank_link_is_none() {
        assert_eq!(link(Some("  ".into())).unwrap(), None);
        assert_eq!(link(None).unwrap(), None);
        assert_eq!(
            link(Some("https://example.com".into())).unwrap().as_deref(),
            Some("https://example.com")
        );
        assert!(link(Some("x".repeat(256))).is_err());
    }

    #[test]
    fn collector_keeps_first_message_per_field() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.check::<i32>("name", Err("first".into())), None);
        errors.add("name", "second");
        assert_eq!(errors.check("title", Ok(3)), Some(3));

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["name"], "first");
    }
}
