use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable product in the catalog, priced per package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    pub package_size: Decimal,
    pub package_unit: String,
    pub package_price: Decimal,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    pub fn new(
        name: String,
        brand: String,
        package_size: Decimal,
        package_unit: String,
        package_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            brand,
            category: None,
            supplier: None,
            package_size,
            package_unit,
            package_price,
            units: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Price of one unit of `package_unit`. `None` for a non-positive package
    /// size, or when the ratio does not fit in a `Decimal`.
    pub fn unit_cost(&self) -> Option<Decimal> {
        if self.package_size <= Decimal::ZERO {
            return None;
        }
        self.package_price.checked_div(self.package_size)
    }

    /// Case-insensitive, whitespace-trimmed name comparison.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(size: &str, price: &str) -> Ingredient {
        Ingredient::new(
            "Rum".into(),
            "House".into(),
            Decimal::from_str(size).unwrap(),
            "oz".into(),
            Decimal::from_str(price).unwrap(),
        )
    }

    #[test]
    fn unit_cost_divides_price_by_size() {
        assert_eq!(product("25.4", "12.7").unit_cost(), Some(Decimal::new(5, 1)));
        assert_eq!(product("0", "12.7").unit_cost(), None);
    }

    #[test]
    fn unit_cost_is_none_when_out_of_range() {
        let ingredient = product("0.0000001", "10000000000000000000000");
        assert_eq!(ingredient.unit_cost(), None);
    }
}
