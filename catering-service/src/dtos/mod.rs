pub mod auth;
pub mod clients;
pub mod ingredients;
pub mod quotes;
pub mod recipes;

use rust_decimal::Decimal;
use serde::Serialize;
use std::borrow::Cow;
use validator::ValidationError;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub(crate) fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Largest package size, price or quantity the catalog and quotes accept.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
/// Smallest package size accepted (0.0001).
pub const MIN_PACKAGE_SIZE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);
/// Upper bound for tax, indirect cost and margin percentages.
pub const MAX_PERCENTAGE: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

pub(crate) fn validate_package_size(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        Err(invalid("package_size", "Package size must be greater than 0"))
    } else if *value < MIN_PACKAGE_SIZE {
        Err(invalid("package_size", "Package size must be at least 0.0001"))
    } else if *value > MAX_AMOUNT {
        Err(invalid("package_size", "Package size cannot exceed 1000000000"))
    } else {
        Ok(())
    }
}

pub(crate) fn validate_package_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(invalid("package_price", "Package price cannot be negative"))
    } else if *value > MAX_AMOUNT {
        Err(invalid("package_price", "Package price cannot exceed 1000000000"))
    } else {
        Ok(())
    }
}

pub(crate) fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(invalid("quantity", "Quantity cannot be negative"))
    } else if *value > MAX_AMOUNT {
        Err(invalid("quantity", "Quantity cannot exceed 1000000000"))
    } else {
        Ok(())
    }
}

/// Checks an optional percentage against `[0, max]`.
pub(crate) fn check_percentage(
    value: Option<Decimal>,
    max: Decimal,
    label: &str,
) -> Result<(), String> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => {
            Err(format!("{} cannot be negative", label))
        }
        Some(v) if v > max => Err(format!("{} cannot exceed {}", label, max)),
        _ => Ok(()),
    }
}
