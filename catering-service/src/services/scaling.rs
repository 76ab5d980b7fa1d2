use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Recipe, RecipeIngredientLine};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    #[error("Servings must be greater than zero")]
    InvalidServings,

    #[error("Scaled quantity of {0} is too large")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScaledRecipe {
    pub recipe_id: String,
    pub recipe_name: String,
    pub original_servings: u32,
    pub servings: u32,
    pub factor: Decimal,
    pub ingredients: Vec<RecipeIngredientLine>,
}

/// Scales every ingredient quantity of `recipe` to yield `servings`
/// portions. Recipes without a yield count as one serving. Scaled quantities
/// are rounded to two decimals.
pub fn scale_recipe(recipe: &Recipe, servings: u32) -> Result<ScaledRecipe, ScaleError> {
    if servings == 0 {
        return Err(ScaleError::InvalidServings);
    }

    let original = recipe.servings.filter(|s| *s > 0).unwrap_or(1);
    let factor = Decimal::from(servings) / Decimal::from(original);

    let ingredients = recipe
        .ingredients
        .iter()
        .map(|line| {
            let quantity = line
                .quantity
                .checked_mul(factor)
                .ok_or_else(|| ScaleError::OutOfRange(line.ingredient_name.clone()))?;
            Ok(RecipeIngredientLine {
                quantity: quantity.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                ..line.clone()
            })
        })
        .collect::<Result<Vec<_>, ScaleError>>()?;

    Ok(ScaledRecipe {
        recipe_id: recipe.id.clone(),
        recipe_name: recipe.name.clone(),
        original_servings: original,
        servings,
        factor,
        ingredients,
    })
}
