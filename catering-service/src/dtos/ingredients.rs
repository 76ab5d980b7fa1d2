use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::{validate_package_price, validate_package_size};
use crate::models::Ingredient;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub name: String,
    #[serde(alias = "product")]
    #[validate(length(min = 1, message = "Brand is required"))]
    pub brand: String,
    pub category: Option<String>,
    pub supplier: Option<String>,
    #[validate(custom(function = "validate_package_size"))]
    pub package_size: Decimal,
    #[validate(length(min = 1, message = "Package unit is required"))]
    pub package_unit: String,
    #[validate(custom(function = "validate_package_price"))]
    pub package_price: Decimal,
    #[serde(default)]
    pub units: Vec<String>,
}

impl CreateIngredientRequest {
    pub fn into_ingredient(self) -> Ingredient {
        let mut ingredient = Ingredient::new(
            self.name.trim().to_string(),
            self.brand.trim().to_string(),
            self.package_size,
            self.package_unit.trim().to_string(),
            self.package_price,
        );
        ingredient.category = self.category;
        ingredient.supplier = self.supplier;
        ingredient.units = self.units;
        ingredient
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIngredientRequest {
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub name: Option<String>,
    #[serde(alias = "product")]
    #[validate(length(min = 1, message = "Brand is required"))]
    pub brand: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,
    #[validate(custom(function = "validate_package_size"))]
    pub package_size: Option<Decimal>,
    #[validate(length(min = 1, message = "Package unit is required"))]
    pub package_unit: Option<String>,
    #[validate(custom(function = "validate_package_price"))]
    pub package_price: Option<Decimal>,
    pub units: Option<Vec<String>>,
}

impl UpdateIngredientRequest {
    pub fn apply(self, ingredient: &mut Ingredient) {
        if let Some(name) = self.name {
            ingredient.name = name.trim().to_string();
        }
        if let Some(brand) = self.brand {
            ingredient.brand = brand.trim().to_string();
        }
        if let Some(category) = self.category {
            ingredient.category = Some(category);
        }
        if let Some(supplier) = self.supplier {
            ingredient.supplier = Some(supplier);
        }
        if let Some(size) = self.package_size {
            ingredient.package_size = size;
        }
        if let Some(unit) = self.package_unit {
            ingredient.package_unit = unit.trim().to_string();
        }
        if let Some(price) = self.package_price {
            ingredient.package_price = price;
        }
        if let Some(units) = self.units {
            ingredient.units = units;
        }
        ingredient.updated_at = Utc::now();
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub package_size: Decimal,
    pub package_unit: String,
    pub package_price: Decimal,
    pub unit_cost: Option<Decimal>,
    pub units: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            unit_cost: ingredient.unit_cost(),
            id: ingredient.id,
            name: ingredient.name,
            brand: ingredient.brand,
            category: ingredient.category,
            supplier: ingredient.supplier,
            package_size: ingredient.package_size,
            package_unit: ingredient.package_unit,
            package_price: ingredient.package_price,
            units: ingredient.units,
            created_at: ingredient.created_at,
            updated_at: ingredient.updated_at,
        }
    }
}
