use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{check_percentage, validate_quantity, MAX_PERCENTAGE};
use crate::models::{Recipe, RecipeCategory, RecipeIngredientLine};
use crate::services::costing::{CostingOptions, MissingIngredientPolicy};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLinePayload {
    #[serde(alias = "name")]
    #[validate(length(min = 1, message = "Ingredient name is required"))]
    pub ingredient_name: String,
    pub product_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
}

impl From<IngredientLinePayload> for RecipeIngredientLine {
    fn from(line: IngredientLinePayload) -> Self {
        Self {
            ingredient_name: line.ingredient_name.trim().to_string(),
            product_id: line.product_id.filter(|id| !id.is_empty()),
            quantity: line.quantity,
            unit: line.unit.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, message = "Recipe name is required"))]
    pub name: String,
    #[serde(alias = "type")]
    pub category: RecipeCategory,
    pub method: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Servings must be at least 1"))]
    pub servings: Option<u32>,
    #[serde(default)]
    #[validate(nested)]
    pub ingredients: Vec<IngredientLinePayload>,
}

impl CreateRecipeRequest {
    pub fn into_recipe(self) -> Recipe {
        let mut recipe = Recipe::new(
            self.name.trim().to_string(),
            self.category,
            self.servings,
            self.ingredients.into_iter().map(Into::into).collect(),
        );
        recipe.method = self.method;
        recipe.description = self.description;
        recipe
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostingQuery {
    pub indirect_percentage: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    /// Fail instead of costing unknown ingredients at zero.
    #[serde(default)]
    pub strict: bool,
}

impl CostingQuery {
    pub fn options(&self) -> Result<CostingOptions, AppError> {
        costing_options(self.indirect_percentage, self.profit_margin, self.strict)
    }
}

pub(crate) fn costing_options(
    indirect_percentage: Option<Decimal>,
    profit_margin: Option<Decimal>,
    strict: bool,
) -> Result<CostingOptions, AppError> {
    check_percentage(indirect_percentage, MAX_PERCENTAGE, "Indirect percentage")
        .and_then(|_| check_percentage(profit_margin, MAX_PERCENTAGE, "Profit margin"))
        .map_err(|m| AppError::BadRequest(anyhow::anyhow!(m)))?;

    Ok(CostingOptions {
        indirect_percentage: indirect_percentage.unwrap_or_default(),
        profit_margin: profit_margin.unwrap_or_default(),
        missing_ingredients: if strict {
            MissingIngredientPolicy::Reject
        } else {
            MissingIngredientPolicy::TreatAsFree
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct ScaleQuery {
    pub servings: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: String,
    pub name: String,
    pub category: RecipeCategory,
    pub category_label: &'static str,
    pub method: Option<String>,
    pub description: Option<String>,
    pub servings: Option<u32>,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            category_label: recipe.category.label(),
            id: recipe.id,
            name: recipe.name,
            category: recipe.category,
            method: recipe.method,
            description: recipe.description,
            servings: recipe.servings,
            ingredients: recipe.ingredients,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}
