/// Input validators
/// - Length limits on every free-text field (DoS protection)
/// - Email format checks before an address becomes an identity
/// - Control-character rejection for names, codes and addresses
/// - Range checks for prices and stock quantities

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MAX_ADDRESS_LENGTH: usize = 1024;
const MAX_CODE_LENGTH: usize = 64;
// Bounds the KDF input; there are deliberately no composition rules
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref PRODUCT_CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    // Local part over 64 chars is a phishing indicator and not RFC-valid anyway
    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a person's name (first or last)
pub fn is_valid_name(field: &'static str, name: &str) -> Result<String, ValidationError> {
    free_text(field, name, MAX_NAME_LENGTH)
}

/// Validates a warehouse address
pub fn is_valid_address(address: &str) -> Result<String, ValidationError> {
    free_text("address", address, MAX_ADDRESS_LENGTH)
}

/// Product codes are short identifiers such as `A01` or `SKU-2024.7`
pub fn is_valid_product_code(code: &str) -> Result<String, ValidationError> {
    let trimmed = code.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("code"));
    }
    if trimmed.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong("code", MAX_CODE_LENGTH));
    }
    if !PRODUCT_CODE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("code"));
    }

    Ok(trimmed.to_string())
}

/// Passwords only need to be present and bounded in length
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::OutOfRange("price"));
    }
    Ok(price)
}

/// Stock adjustments move a strictly positive amount
pub fn validate_quantity(qty: f64) -> Result<f64, ValidationError> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::OutOfRange("qty"));
    }
    Ok(qty)
}

fn free_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong(field, max));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}
