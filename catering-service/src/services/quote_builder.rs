//! Turns a selection of recipes into priced, snapshotted quote lines.
//!
//! Nothing here touches storage. The quote service persists the result only
//! once a build has succeeded.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{EventInfo, Ingredient, Pricing, QuoteItem, Recipe};
use crate::services::costing::{checked_sum, cost_recipe, CostingError, CostingOptions};

/// Highest tax percentage a quote accepts.
pub const MAX_TAX_PERCENTAGE: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("At least one recipe must be selected")]
    EmptySelection,

    #[error("{0} is required")]
    MissingRequiredField(&'static str),

    #[error("Discount percentage must be between 0 and 100")]
    InvalidDiscount,

    #[error("Tax percentage must be between 0 and 1000")]
    InvalidTax,

    #[error("Number of people must be at least 1")]
    InvalidNumberOfPeople,

    #[error("Servings must be at least 1 for recipe {0}")]
    InvalidServings(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Quote amounts are too large to compute")]
    OutOfRange,

    #[error(transparent)]
    Costing(#[from] CostingError),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub recipe_id: String,
    #[serde(default)]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteDraft {
    pub client_id: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub number_of_people: Option<u32>,
    pub discount_percentage: Decimal,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub selections: Vec<Selection>,
}

/// Values applied when a draft leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderDefaults {
    pub tax_percentage: Decimal,
    pub number_of_people: u32,
}

impl Default for BuilderDefaults {
    fn default() -> Self {
        Self {
            tax_percentage: Decimal::new(15, 0),
            number_of_people: 50,
        }
    }
}

/// Priced lines for a selection, without client or event details.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedSelection {
    pub number_of_people: u32,
    pub items: Vec<QuoteItem>,
    pub pricing: Pricing,
    pub unresolved_ingredients: Vec<String>,
}

/// A complete quote body ready to be numbered and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuote {
    pub client_id: String,
    pub event_info: EventInfo,
    pub items: Vec<QuoteItem>,
    pub pricing: Pricing,
    pub notes: Option<String>,
    pub unresolved_ingredients: Vec<String>,
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_rates(discount_percentage: Decimal, tax_percentage: Decimal) -> Result<(), QuoteError> {
    if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE_HUNDRED {
        return Err(QuoteError::InvalidDiscount);
    }
    if tax_percentage < Decimal::ZERO || tax_percentage > MAX_TAX_PERCENTAGE {
        return Err(QuoteError::InvalidTax);
    }
    Ok(())
}

/// Derives discount, tax and total from a subtotal. Amounts are rounded to
/// cents and the total is built from the rounded parts, so
/// `total == subtotal - discount_amount + tax_amount` holds exactly.
pub fn compute_pricing(
    subtotal: Decimal,
    discount_percentage: Decimal,
    tax_percentage: Decimal,
) -> Result<Pricing, QuoteError> {
    let percent_of = |value: Decimal, percentage: Decimal| {
        value
            .checked_mul(percentage)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(round_money)
            .ok_or(QuoteError::OutOfRange)
    };

    let discount_amount = percent_of(subtotal, discount_percentage)?;
    let taxable = subtotal
        .checked_sub(discount_amount)
        .ok_or(QuoteError::OutOfRange)?;
    let tax_amount = percent_of(taxable, tax_percentage)?;
    let total = taxable
        .checked_add(tax_amount)
        .ok_or(QuoteError::OutOfRange)?;

    Ok(Pricing {
        subtotal,
        discount_percentage,
        discount_amount,
        tax_percentage,
        tax_amount,
        total,
    })
}

pub fn price_items(
    items: &[QuoteItem],
    discount_percentage: Decimal,
    tax_percentage: Decimal,
) -> Result<Pricing, QuoteError> {
    let subtotal =
        checked_sum(items.iter().map(|item| item.subtotal)).ok_or(QuoteError::OutOfRange)?;
    compute_pricing(subtotal, discount_percentage, tax_percentage)
}

/// Costs every selected recipe and prices the resulting lines.
pub fn price_selection(
    draft: &QuoteDraft,
    recipes: &[Recipe],
    catalog: &[Ingredient],
    options: &CostingOptions,
    defaults: &BuilderDefaults,
) -> Result<PricedSelection, QuoteError> {
    if draft.selections.is_empty() {
        return Err(QuoteError::EmptySelection);
    }

    let tax_percentage = draft.tax_percentage.unwrap_or(defaults.tax_percentage);
    validate_rates(draft.discount_percentage, tax_percentage)?;

    let number_of_people = draft.number_of_people.unwrap_or(defaults.number_of_people);
    if number_of_people == 0 {
        return Err(QuoteError::InvalidNumberOfPeople);
    }

    let mut items = Vec::with_capacity(draft.selections.len());
    let mut unresolved = Vec::new();

    for selection in &draft.selections {
        let recipe = recipes
            .iter()
            .find(|recipe| recipe.id == selection.recipe_id)
            .ok_or_else(|| QuoteError::RecipeNotFound(selection.recipe_id.clone()))?;

        let servings = selection.servings.unwrap_or(number_of_people);
        if servings == 0 {
            return Err(QuoteError::InvalidServings(recipe.name.clone()));
        }

        let breakdown = cost_recipe(recipe, catalog, options)?;
        unresolved.extend(breakdown.unresolved_ingredients.iter().cloned());

        let price_per_serving = round_money(breakdown.unit_price());
        let subtotal = price_per_serving
            .checked_mul(Decimal::from(servings))
            .ok_or(QuoteError::OutOfRange)?;
        items.push(QuoteItem {
            recipe_id: Some(recipe.id.clone()),
            recipe_name: recipe.name.clone(),
            recipe_type: recipe.category.as_str().to_string(),
            servings,
            price_per_serving,
            subtotal,
        });
    }

    let pricing = price_items(&items, draft.discount_percentage, tax_percentage)?;

    Ok(PricedSelection {
        number_of_people,
        items,
        pricing,
        unresolved_ingredients: unresolved,
    })
}

/// Validates a draft and prices it into a storable quote body.
///
/// Guards run in a fixed order: empty selection, client, event date, rates,
/// then per-recipe checks.
pub fn build_quote(
    draft: &QuoteDraft,
    recipes: &[Recipe],
    catalog: &[Ingredient],
    options: &CostingOptions,
    defaults: &BuilderDefaults,
) -> Result<BuiltQuote, QuoteError> {
    if draft.selections.is_empty() {
        return Err(QuoteError::EmptySelection);
    }

    let client_id = draft
        .client_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(QuoteError::MissingRequiredField("clientId"))?
        .to_string();
    let event_date = draft
        .event_date
        .ok_or(QuoteError::MissingRequiredField("eventDate"))?;

    let priced = price_selection(draft, recipes, catalog, options, defaults)?;

    Ok(BuiltQuote {
        client_id,
        event_info: EventInfo {
            number_of_people: priced.number_of_people,
            event_date,
        },
        items: priced.items,
        pricing: priced.pricing,
        notes: draft.notes.clone(),
        unresolved_ingredients: priced.unresolved_ingredients,
    })
}
