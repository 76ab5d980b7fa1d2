//! Quote workflows on top of the store: building from recipes, direct
//! creation, edits and reporting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::models::{EventInfo, Ingredient, Quote, QuoteItem, QuoteStatus, Recipe};
use crate::services::costing::CostingOptions;
use crate::services::error::ServiceError;
use crate::services::quote_builder::{
    build_quote, price_items, price_selection, validate_rates, BuilderDefaults, PricedSelection,
    QuoteDraft,
};
use crate::services::store::{
    ClientRepository, IngredientFilter, IngredientRepository, QuoteFilter, QuoteRepository,
    RecipeRepository, Store,
};

const NUMBER_ATTEMPTS: usize = 3;
/// Distinct six-digit suffixes a generated quote number can take.
const NUMBER_SPACE: i64 = 1_000_000;

/// A fully specified quote coming from `POST /api/quotes`.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub number: String,
    pub client_id: String,
    pub event_info: EventInfo,
    pub items: Vec<QuoteItem>,
    pub discount_percentage: Decimal,
    pub tax_percentage: Option<Decimal>,
    /// Total as computed by the caller, only compared against ours.
    pub supplied_total: Option<Decimal>,
    pub status: QuoteStatus,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct QuotePatch {
    pub number: Option<String>,
    pub client_id: Option<String>,
    pub event_info: Option<EventInfo>,
    pub status: Option<QuoteStatus>,
    pub discount_percentage: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl QuotePatch {
    fn changes_content(&self) -> bool {
        self.number.is_some()
            || self.client_id.is_some()
            || self.event_info.is_some()
            || self.discount_percentage.is_some()
            || self.tax_percentage.is_some()
            || self.notes.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub approved_value: Decimal,
}

/// `QT-` followed by the last six digits of a millisecond timestamp.
pub fn number_from_millis(millis: i64) -> String {
    format!("QT-{:06}", millis.rem_euclid(1_000_000))
}

#[derive(Clone)]
pub struct QuoteService {
    store: Arc<dyn Store>,
    defaults: BuilderDefaults,
}

impl QuoteService {
    pub fn new(store: Arc<dyn Store>, defaults: BuilderDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn defaults(&self) -> &BuilderDefaults {
        &self.defaults
    }

    /// First unused quote number at or after the current millisecond.
    pub async fn next_number(&self) -> Result<String, ServiceError> {
        self.next_number_from(Utc::now().timestamp_millis()).await
    }

    async fn next_number_from(&self, millis: i64) -> Result<String, ServiceError> {
        for offset in 0..NUMBER_SPACE {
            let candidate = number_from_millis(millis.wrapping_add(offset));
            if !self.store.quote_number_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        tracing::error!("Every generated quote number is taken");
        Err(ServiceError::DuplicateNumber)
    }

    async fn load_inputs(
        &self,
        draft: &QuoteDraft,
    ) -> Result<(Vec<Recipe>, Vec<Ingredient>), ServiceError> {
        let ids: Vec<String> = draft.selections.iter().map(|s| s.recipe_id.clone()).collect();
        let recipes = self.store.find_recipes(&ids).await?;
        let catalog = self
            .store
            .list_ingredients(&IngredientFilter::default())
            .await?;
        Ok((recipes, catalog))
    }

    /// Prices a selection without persisting anything.
    pub async fn preview(
        &self,
        draft: &QuoteDraft,
        options: &CostingOptions,
    ) -> Result<PricedSelection, ServiceError> {
        if draft.selections.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        let (recipes, catalog) = self.load_inputs(draft).await?;
        Ok(price_selection(draft, &recipes, &catalog, options, &self.defaults)?)
    }

    /// Builds a quote from recipes and stores it.
    pub async fn build(
        &self,
        draft: &QuoteDraft,
        options: &CostingOptions,
        created_by: Option<String>,
    ) -> Result<Quote, ServiceError> {
        // An empty selection never reaches the store.
        if draft.selections.is_empty() {
            return Err(ServiceError::EmptySelection);
        }

        let (recipes, catalog) = self.load_inputs(draft).await?;
        let built = build_quote(draft, &recipes, &catalog, options, &self.defaults)?;

        let client = self
            .store
            .get_client(&built.client_id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;

        if !built.unresolved_ingredients.is_empty() {
            tracing::warn!(
                unresolved = ?built.unresolved_ingredients,
                "Quote built with ingredients missing from the catalog"
            );
        }

        let mut quote = Quote::new(
            String::new(),
            client.id,
            client.name,
            built.event_info,
            built.items,
            built.pricing,
        );
        quote.notes = built.notes;
        quote.created_by = created_by;

        self.insert_with_fresh_number(quote, "builder").await
    }

    async fn insert_with_fresh_number(
        &self,
        mut quote: Quote,
        source: &'static str,
    ) -> Result<Quote, ServiceError> {
        for _ in 0..NUMBER_ATTEMPTS {
            quote.number = self.next_number().await?;
            match self.store.insert_quote(&quote).await {
                Ok(()) => {
                    record_created(&quote, source);
                    return Ok(quote);
                }
                Err(ServiceError::DuplicateNumber) => {
                    tracing::debug!(number = %quote.number, "Quote number taken, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ServiceError::DuplicateNumber)
    }

    /// Stores a quote assembled by the caller. Pricing is recomputed from
    /// the line items so the stored totals are always consistent.
    pub async fn create(
        &self,
        input: NewQuote,
        created_by: Option<String>,
    ) -> Result<Quote, ServiceError> {
        let tax_percentage = input.tax_percentage.unwrap_or(self.defaults.tax_percentage);
        validate_rates(input.discount_percentage, tax_percentage)?;

        let client = self
            .store
            .get_client(&input.client_id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;

        let pricing = price_items(&input.items, input.discount_percentage, tax_percentage)?;
        if let Some(supplied) = input.supplied_total {
            if supplied != pricing.total {
                tracing::warn!(
                    number = %input.number,
                    supplied = %supplied,
                    computed = %pricing.total,
                    "Supplied quote total differs from recomputed total"
                );
            }
        }

        if self.store.quote_number_exists(&input.number).await? {
            return Err(ServiceError::DuplicateNumber);
        }

        let mut quote = Quote::new(
            input.number,
            client.id,
            client.name,
            input.event_info,
            input.items,
            pricing,
        );
        quote.status = input.status;
        quote.notes = input.notes;
        quote.created_by = created_by;
        if let Some(date) = input.date {
            quote.date = date;
        }

        self.store.insert_quote(&quote).await?;
        record_created(&quote, "direct");
        Ok(quote)
    }

    pub async fn list(&self, filter: &QuoteFilter) -> Result<Vec<Quote>, ServiceError> {
        self.store.list_quotes(filter).await
    }

    pub async fn get(&self, id: &str) -> Result<Quote, ServiceError> {
        self.store
            .get_quote(id)
            .await?
            .ok_or(ServiceError::NotFound("Quote"))
    }

    pub async fn update(&self, id: &str, patch: QuotePatch) -> Result<Quote, ServiceError> {
        let mut quote = self.get(id).await?;

        if quote.is_locked() && patch.changes_content() {
            return Err(ServiceError::QuoteLocked);
        }

        if let Some(client_id) = patch.client_id {
            let client = self
                .store
                .get_client(&client_id)
                .await?
                .ok_or(ServiceError::NotFound("Client"))?;
            quote.client_id = client.id;
            quote.client_name = client.name;
        }

        if let Some(number) = patch.number {
            let number = number.trim().to_string();
            if number.is_empty() {
                return Err(ServiceError::Validation("Quote number is required".into()));
            }
            if number != quote.number && self.store.quote_number_exists(&number).await? {
                return Err(ServiceError::DuplicateNumber);
            }
            quote.number = number;
        }

        if let Some(event_info) = patch.event_info {
            if event_info.number_of_people == 0 {
                return Err(ServiceError::Validation(
                    "Number of people must be at least 1".into(),
                ));
            }
            quote.event_info = event_info;
        }

        if let Some(notes) = patch.notes {
            quote.notes = Some(notes);
        }

        if let Some(status) = patch.status {
            if status != quote.status {
                tracing::info!(
                    quote_id = %quote.id,
                    from = %quote.status,
                    to = %status,
                    "Quote status changed"
                );
            }
            quote.status = status;
        }

        let discount = patch
            .discount_percentage
            .unwrap_or(quote.pricing.discount_percentage);
        let tax = patch.tax_percentage.unwrap_or(quote.pricing.tax_percentage);
        validate_rates(discount, tax)?;
        quote.set_pricing(price_items(&quote.items, discount, tax)?);
        quote.updated_at = Utc::now();

        if !self.store.replace_quote(&quote).await? {
            return Err(ServiceError::NotFound("Quote"));
        }
        Ok(quote)
    }

    /// Deletes a quote. Approved quotes cannot be removed.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let quote = self.get(id).await?;
        if quote.is_locked() {
            return Err(ServiceError::QuoteLocked);
        }

        if self.store.delete_quote(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("Quote"))
        }
    }

    pub async fn stats(&self) -> Result<QuoteStats, ServiceError> {
        let quotes = self.store.list_quotes(&QuoteFilter::default()).await?;
        let mut stats = QuoteStats {
            total: quotes.len(),
            ..Default::default()
        };
        for quote in &quotes {
            match quote.status {
                QuoteStatus::Pending => stats.pending += 1,
                QuoteStatus::Approved => {
                    stats.approved += 1;
                    stats.approved_value = stats.approved_value.saturating_add(quote.total);
                }
                QuoteStatus::Rejected => stats.rejected += 1,
            }
        }
        Ok(stats)
    }
}

fn record_created(quote: &Quote, source: &'static str) {
    metrics::counter!("quotes_created_total", "source" => source).increment(1);
    tracing::info!(
        quote_id = %quote.id,
        number = %quote.number,
        client_id = %quote.client_id,
        total = %quote.total,
        "Quote created"
    );
}
