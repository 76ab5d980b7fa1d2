//! Recipe costing.
//!
//! The single place that turns a recipe and the ingredient catalog into a
//! cost breakdown and selling price. Costing endpoints, quote previews and
//! quote builds all go through [`cost_recipe`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Ingredient, Recipe, RecipeCategory, RecipeIngredientLine};
use crate::services::units::{convert_units, Unit};

/// Cocktails are sold at three times their ingredient cost.
pub const COCKTAIL_MARKUP: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
/// Tax applied on top of the cocktail base price (25%).
pub const COCKTAIL_TAX_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostingError {
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Cost of {0} is too large to compute")]
    OutOfRange(String),
}

/// What to do with a recipe line that matches nothing in the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingIngredientPolicy {
    /// Cost the line at zero and report it in `unresolved_ingredients`.
    #[default]
    TreatAsFree,
    /// Fail with [`CostingError::IngredientNotFound`].
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostingOptions {
    pub indirect_percentage: Decimal,
    pub profit_margin: Decimal,
    pub missing_ingredients: MissingIngredientPolicy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    pub ingredient_name: String,
    pub product_id: Option<String>,
    pub brand: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    /// Quantity expressed in the product's package unit.
    pub costed_quantity: Decimal,
    pub unit_cost: Decimal,
    pub cost: Decimal,
    pub resolved: bool,
    /// Other catalog products sharing this ingredient's name.
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub recipe_id: String,
    pub recipe_name: String,
    pub category: RecipeCategory,
    pub ingredients_cost: Decimal,
    pub indirect_costs: Decimal,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub taxes: Decimal,
    pub servings: Option<u32>,
    pub cost_per_serving: Option<Decimal>,
    pub price_per_serving: Option<Decimal>,
    pub lines: Vec<LineCost>,
    pub unresolved_ingredients: Vec<String>,
}

impl CostBreakdown {
    /// Price of one serving, or of the whole recipe when it has no servings.
    pub fn unit_price(&self) -> Decimal {
        self.price_per_serving.unwrap_or(self.selling_price)
    }
}

/// Finds the catalog product for a line: explicit product id first, then a
/// case-insensitive name match.
pub fn resolve_line<'a>(
    line: &RecipeIngredientLine,
    catalog: &'a [Ingredient],
) -> Option<&'a Ingredient> {
    line.product_id
        .as_deref()
        .and_then(|id| catalog.iter().find(|product| product.id == id))
        .or_else(|| {
            catalog
                .iter()
                .find(|product| product.matches_name(&line.ingredient_name))
        })
}

fn costed_quantity(line: &RecipeIngredientLine, product: &Ingredient) -> Option<Decimal> {
    match (
        line.unit.parse::<Unit>(),
        product.package_unit.parse::<Unit>(),
    ) {
        (Ok(from), Ok(to)) if from != to => convert_units(line.quantity, from, to),
        _ => Some(line.quantity),
    }
}

/// Sums without overflowing; `None` once the total no longer fits.
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

fn percent_of(value: Decimal, percentage: Decimal) -> Option<Decimal> {
    value.checked_mul(percentage)?.checked_div(HUNDRED)
}

fn cost_line(
    line: &RecipeIngredientLine,
    catalog: &[Ingredient],
) -> Result<LineCost, CostingError> {
    let Some(product) = resolve_line(line, catalog) else {
        return Ok(LineCost {
            ingredient_name: line.ingredient_name.clone(),
            product_id: None,
            brand: None,
            quantity: line.quantity,
            unit: line.unit.clone(),
            costed_quantity: line.quantity,
            unit_cost: Decimal::ZERO,
            cost: Decimal::ZERO,
            resolved: false,
            alternatives: Vec::new(),
        });
    };

    let out_of_range = || CostingError::OutOfRange(line.ingredient_name.clone());
    let unit_cost = product.unit_cost().ok_or_else(out_of_range)?;
    let quantity = costed_quantity(line, product).ok_or_else(out_of_range)?;
    let cost = quantity.checked_mul(unit_cost).ok_or_else(out_of_range)?;
    let alternatives = catalog
        .iter()
        .filter(|other| other.id != product.id && other.matches_name(&product.name))
        .map(|other| other.id.clone())
        .collect();

    Ok(LineCost {
        ingredient_name: line.ingredient_name.clone(),
        product_id: Some(product.id.clone()),
        brand: Some(product.brand.clone()),
        quantity: line.quantity,
        unit: line.unit.clone(),
        costed_quantity: quantity,
        unit_cost,
        cost,
        resolved: true,
        alternatives,
    })
}

/// Computes the cost breakdown and selling price of `recipe`.
pub fn cost_recipe(
    recipe: &Recipe,
    catalog: &[Ingredient],
    options: &CostingOptions,
) -> Result<CostBreakdown, CostingError> {
    let mut lines = Vec::with_capacity(recipe.ingredients.len());
    let mut unresolved = Vec::new();

    for line in &recipe.ingredients {
        let cost = cost_line(line, catalog)?;
        if !cost.resolved {
            match options.missing_ingredients {
                MissingIngredientPolicy::Reject => {
                    return Err(CostingError::IngredientNotFound(
                        line.ingredient_name.clone(),
                    ));
                }
                MissingIngredientPolicy::TreatAsFree => {
                    tracing::warn!(
                        recipe = %recipe.name,
                        ingredient = %line.ingredient_name,
                        "Ingredient not in catalog, costing line at zero"
                    );
                    unresolved.push(line.ingredient_name.clone());
                }
            }
        }
        lines.push(cost);
    }

    let out_of_range = || CostingError::OutOfRange(recipe.name.clone());
    let ingredients_cost =
        checked_sum(lines.iter().map(|line| line.cost)).ok_or_else(out_of_range)?;

    let priced = if recipe.category.is_cocktail() {
        ingredients_cost
            .checked_mul(COCKTAIL_MARKUP)
            .and_then(|base_price| {
                let taxes = base_price.checked_mul(COCKTAIL_TAX_RATE)?;
                Some((Decimal::ZERO, ingredients_cost, base_price.checked_add(taxes)?, taxes))
            })
    } else {
        percent_of(ingredients_cost, options.indirect_percentage).and_then(|indirect| {
            let total = ingredients_cost.checked_add(indirect)?;
            let factor = Decimal::ONE.checked_add(options.profit_margin.checked_div(HUNDRED)?)?;
            Some((indirect, total, total.checked_mul(factor)?, Decimal::ZERO))
        })
    };
    let (indirect_costs, total_cost, selling_price, taxes) = priced.ok_or_else(out_of_range)?;

    let servings = recipe.servings.filter(|servings| *servings > 0);
    let per_serving = |value: Decimal| servings.and_then(|s| value.checked_div(Decimal::from(s)));

    Ok(CostBreakdown {
        recipe_id: recipe.id.clone(),
        recipe_name: recipe.name.clone(),
        category: recipe.category,
        ingredients_cost,
        indirect_costs,
        total_cost,
        selling_price,
        taxes,
        servings,
        cost_per_serving: per_serving(total_cost),
        price_per_serving: per_serving(selling_price),
        lines,
        unresolved_ingredients: unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn product(name: &str, size: &str, unit: &str, price: &str) -> Ingredient {
        Ingredient::new(
            name.to_string(),
            "House".to_string(),
            dec(size),
            unit.to_string(),
            dec(price),
        )
    }

    fn line(name: &str, quantity: &str, unit: &str) -> RecipeIngredientLine {
        RecipeIngredientLine {
            ingredient_name: name.to_string(),
            product_id: None,
            quantity: dec(quantity),
            unit: unit.to_string(),
        }
    }

    fn daiquiri_catalog() -> Vec<Ingredient> {
        vec![
            product("Rum", "1", "oz", "0.32"),
            product("Lime Juice", "1", "oz", "0.20"),
        ]
    }

    fn daiquiri() -> Recipe {
        Recipe::new(
            "Daiquiri".to_string(),
            RecipeCategory::Cocktail,
            None,
            vec![line("Rum", "2", "oz"), line("lime juice ", "1", "oz")],
        )
    }

    #[test]
    fn cocktail_pricing_matches_worked_example() {
        let breakdown =
            cost_recipe(&daiquiri(), &daiquiri_catalog(), &CostingOptions::default()).unwrap();

        assert_eq!(breakdown.ingredients_cost, dec("0.84"));
        assert_eq!(breakdown.total_cost, dec("0.84"));
        assert_eq!(breakdown.taxes, dec("0.63"));
        assert_eq!(breakdown.selling_price, dec("3.15"));
        assert!(breakdown.unresolved_ingredients.is_empty());
    }

    #[test]
    fn cocktail_ignores_indirect_and_margin() {
        let options = CostingOptions {
            indirect_percentage: dec("40"),
            profit_margin: dec("80"),
            ..Default::default()
        };
        let breakdown = cost_recipe(&daiquiri(), &daiquiri_catalog(), &options).unwrap();

        assert_eq!(breakdown.indirect_costs, Decimal::ZERO);
        assert_eq!(
            breakdown.selling_price,
            breakdown.total_cost * dec("3") * dec("1.25")
        );
        assert_eq!(breakdown.selling_price, dec("3.15"));
    }

    #[test]
    fn non_cocktail_applies_indirect_then_margin() {
        let catalog = vec![product("Flour", "1000", "g", "2.00")];
        let recipe = Recipe::new(
            "Bread".to_string(),
            RecipeCategory::MainCourse,
            Some(4),
            vec![line("Flour", "5000", "g")],
        );
        let options = CostingOptions {
            indirect_percentage: dec("10"),
            profit_margin: dec("50"),
            ..Default::default()
        };

        let breakdown = cost_recipe(&recipe, &catalog, &options).unwrap();

        assert_eq!(breakdown.ingredients_cost, dec("10"));
        assert_eq!(breakdown.indirect_costs, dec("1"));
        assert_eq!(breakdown.total_cost, dec("11"));
        assert_eq!(breakdown.selling_price, dec("16.5"));
        assert_eq!(breakdown.taxes, Decimal::ZERO);
        assert_eq!(
            breakdown.selling_price,
            breakdown.total_cost * (Decimal::ONE + dec("50") / Decimal::ONE_HUNDRED)
        );
        assert_eq!(breakdown.cost_per_serving, Some(dec("2.75")));
        assert_eq!(breakdown.price_per_serving, Some(dec("4.125")));
        assert_eq!(breakdown.unit_price(), dec("4.125"));
    }

    #[test]
    fn unit_price_falls_back_to_selling_price() {
        let breakdown =
            cost_recipe(&daiquiri(), &daiquiri_catalog(), &CostingOptions::default()).unwrap();
        assert_eq!(breakdown.cost_per_serving, None);
        assert_eq!(breakdown.unit_price(), breakdown.selling_price);
    }

    #[test]
    fn product_id_wins_over_name() {
        let house = product("Rum", "1", "oz", "0.32");
        let premium = product("Rum", "1", "oz", "0.90");
        let mut rum = line("Rum", "1", "oz");
        rum.product_id = Some(premium.id.clone());
        let recipe = Recipe::new(
            "Neat".to_string(),
            RecipeCategory::Beverage,
            None,
            vec![rum],
        );

        let breakdown =
            cost_recipe(&recipe, &[house.clone(), premium.clone()], &CostingOptions::default())
                .unwrap();

        assert_eq!(breakdown.ingredients_cost, dec("0.90"));
        assert_eq!(breakdown.lines[0].product_id, Some(premium.id));
        assert_eq!(breakdown.lines[0].alternatives, vec![house.id]);
    }

    #[test]
    fn unknown_product_id_falls_back_to_name() {
        let mut rum = line("Rum", "1", "oz");
        rum.product_id = Some("missing".to_string());
        let recipe = Recipe::new("Neat".to_string(), RecipeCategory::Beverage, None, vec![rum]);

        let breakdown =
            cost_recipe(&recipe, &daiquiri_catalog(), &CostingOptions::default()).unwrap();
        assert_eq!(breakdown.ingredients_cost, dec("0.32"));
    }

    #[test]
    fn line_units_convert_into_package_unit() {
        let catalog = vec![product("Sugar", "1", "kg", "3.00")];
        let recipe = Recipe::new(
            "Syrup".to_string(),
            RecipeCategory::Beverage,
            None,
            vec![line("Sugar", "250", "g")],
        );

        let breakdown = cost_recipe(&recipe, &catalog, &CostingOptions::default()).unwrap();
        assert_eq!(breakdown.lines[0].costed_quantity, dec("0.25"));
        assert_eq!(breakdown.ingredients_cost, dec("0.75"));
    }

    #[test]
    fn unconvertible_units_use_quantity_as_is() {
        let catalog = vec![product("Mint", "20", "leaves", "1.00")];
        let recipe = Recipe::new(
            "Mojito".to_string(),
            RecipeCategory::Cocktail,
            None,
            vec![line("Mint", "8", "leaves")],
        );

        let breakdown = cost_recipe(&recipe, &catalog, &CostingOptions::default()).unwrap();
        assert_eq!(breakdown.ingredients_cost, dec("0.4"));
    }

    #[test]
    fn missing_ingredient_is_free_and_reported_by_default() {
        let mut recipe = daiquiri();
        recipe.ingredients.push(line("Angostura", "1", "dash"));

        let breakdown =
            cost_recipe(&recipe, &daiquiri_catalog(), &CostingOptions::default()).unwrap();

        assert_eq!(breakdown.ingredients_cost, dec("0.84"));
        assert_eq!(breakdown.unresolved_ingredients, vec!["Angostura".to_string()]);
        assert!(!breakdown.lines[2].resolved);
    }

    #[test]
    fn missing_ingredient_fails_under_reject_policy() {
        let mut recipe = daiquiri();
        recipe.ingredients.push(line("Angostura", "1", "dash"));
        let options = CostingOptions {
            missing_ingredients: MissingIngredientPolicy::Reject,
            ..Default::default()
        };

        assert_eq!(
            cost_recipe(&recipe, &daiquiri_catalog(), &options),
            Err(CostingError::IngredientNotFound("Angostura".to_string()))
        );
    }

    #[test]
    fn ingredients_cost_never_decreases_with_quantity() {
        let catalog = daiquiri_catalog();
        let mut previous = Decimal::ZERO;

        for step in 0..20 {
            let mut recipe = daiquiri();
            recipe.ingredients[0].quantity = Decimal::new(step * 25, 2);
            let cost = cost_recipe(&recipe, &catalog, &CostingOptions::default())
                .unwrap()
                .ingredients_cost;
            assert!(cost >= previous, "cost dropped at step {}", step);
            previous = cost;
        }
    }

    #[test]
    fn costing_is_deterministic() {
        let catalog = daiquiri_catalog();
        let recipe = daiquiri();
        let options = CostingOptions::default();

        assert_eq!(
            cost_recipe(&recipe, &catalog, &options),
            cost_recipe(&recipe, &catalog, &options)
        );
    }

    #[test]
    fn unrepresentable_unit_cost_is_out_of_range() {
        let catalog = vec![
            product("Rum", "0.0000001", "oz", "10000000000000000000000"),
            product("Lime Juice", "1", "oz", "0.20"),
        ];

        assert_eq!(
            cost_recipe(&daiquiri(), &catalog, &CostingOptions::default()),
            Err(CostingError::OutOfRange("Rum".to_string()))
        );
    }

    #[test]
    fn markup_overflow_is_out_of_range() {
        let catalog = vec![
            product("Rum", "1", "oz", "1000000000000000000000000000"),
            product("Lime Juice", "1", "oz", "0.20"),
        ];
        let mut recipe = daiquiri();
        recipe.ingredients[0].quantity = dec("30");

        assert_eq!(
            cost_recipe(&recipe, &catalog, &CostingOptions::default()),
            Err(CostingError::OutOfRange("Daiquiri".to_string()))
        );
    }

    #[test]
    fn checked_sum_stops_at_overflow() {
        assert_eq!(checked_sum([dec("1.5"), dec("2.25")]), Some(dec("3.75")));
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), None);
    }
}
