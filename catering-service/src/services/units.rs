//! Kitchen unit conversion.
//!
//! Every unit maps onto a base quantity (grams for weight, millilitres for
//! volume) so any pair of known units converts through the base.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("Value must be a non-negative number")]
    NegativeValue,

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Value is too large to convert")]
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Gram,
    Kilogram,
    Ounce,
    Pound,
    Millilitre,
    Litre,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Gram,
        Unit::Kilogram,
        Unit::Ounce,
        Unit::Pound,
        Unit::Millilitre,
        Unit::Litre,
    ];

    /// Size of one unit expressed in the base unit.
    pub fn factor(&self) -> Decimal {
        match self {
            Unit::Gram | Unit::Millilitre => Decimal::ONE,
            Unit::Kilogram | Unit::Litre => Decimal::new(1000, 0),
            Unit::Ounce => Decimal::new(283495, 4),
            Unit::Pound => Decimal::new(453592, 3),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Ounce => "oz",
            Unit::Pound => "lb",
            Unit::Millilitre => "ml",
            Unit::Litre => "l",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" => Ok(Unit::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(Unit::Kilogram),
            "oz" | "ounce" | "ounces" => Ok(Unit::Ounce),
            "lb" | "lbs" | "pound" | "pounds" => Ok(Unit::Pound),
            "ml" | "millilitre" | "milliliter" | "millilitres" | "milliliters" => {
                Ok(Unit::Millilitre)
            }
            "l" | "lt" | "litre" | "liter" | "litres" | "liters" => Ok(Unit::Litre),
            other => Err(UnitError::UnknownUnit(other.to_string())),
        }
    }
}

/// Converts `value` between two units given by name.
pub fn convert(value: Decimal, from: &str, to: &str) -> Result<Decimal, UnitError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitError::NegativeValue);
    }

    let from: Unit = from.parse()?;
    let to: Unit = to.parse()?;

    convert_units(value, from, to).ok_or(UnitError::OutOfRange)
}

/// `None` when the converted value does not fit in a `Decimal`.
pub fn convert_units(value: Decimal, from: Unit, to: Unit) -> Option<Decimal> {
    if from == to {
        return Some(value);
    }
    value.checked_mul(from.factor())?.checked_div(to.factor())
}
