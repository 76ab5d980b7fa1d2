use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecipeCategory {
    Cocktail,
    Appetizer,
    #[serde(alias = "main")]
    MainCourse,
    Dessert,
    Beverage,
}

impl RecipeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeCategory::Cocktail => "cocktail",
            RecipeCategory::Appetizer => "appetizer",
            RecipeCategory::MainCourse => "main-course",
            RecipeCategory::Dessert => "dessert",
            RecipeCategory::Beverage => "beverage",
        }
    }

    /// Human-readable label used on quotes and exports.
    pub fn label(&self) -> &'static str {
        match self {
            RecipeCategory::Cocktail => "Cocktail",
            RecipeCategory::Appetizer => "Appetizer",
            RecipeCategory::MainCourse => "Main Course",
            RecipeCategory::Dessert => "Dessert",
            RecipeCategory::Beverage => "Beverage",
        }
    }

    pub fn is_cocktail(&self) -> bool {
        *self == RecipeCategory::Cocktail
    }
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cocktail" => Ok(RecipeCategory::Cocktail),
            "appetizer" => Ok(RecipeCategory::Appetizer),
            "main" | "main-course" => Ok(RecipeCategory::MainCourse),
            "dessert" => Ok(RecipeCategory::Dessert),
            "beverage" => Ok(RecipeCategory::Beverage),
            _ => Err(format!("Invalid recipe category: {}", s)),
        }
    }
}

/// One ingredient requirement inside a recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientLine {
    pub ingredient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: RecipeCategory,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientLine>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(
        name: String,
        category: RecipeCategory,
        servings: Option<u32>,
        ingredients: Vec<RecipeIngredientLine>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            category,
            method: None,
            description: None,
            servings,
            ingredients,
            created_at: now,
            updated_at: now,
        }
    }
}
