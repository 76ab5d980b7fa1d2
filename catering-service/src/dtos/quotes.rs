use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::dtos::recipes::costing_options;
use crate::dtos::{check_percentage, MAX_AMOUNT, MAX_PERCENTAGE};
use crate::models::{EventInfo, Pricing, Quote, QuoteItem, QuoteStatus};
use crate::services::costing::CostingOptions;
use crate::services::quote_builder::{PricedSelection, QuoteDraft, Selection};
use crate::services::quotes::{NewQuote, QuotePatch};
use crate::services::store::QuoteFilter;

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(message.to_string()))
}

fn required<T>(value: Option<T>, message: &str) -> Result<T, AppError> {
    value.ok_or_else(|| bad_request(message))
}

fn required_text(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_request(message))
}

fn non_negative(value: Decimal, message: &str) -> Result<Decimal, AppError> {
    if value < Decimal::ZERO {
        Err(bad_request(message))
    } else {
        Ok(value)
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| bad_request("Event date is invalid"))
}

fn parse_status(raw: &str) -> Result<QuoteStatus, AppError> {
    raw.parse()
        .map_err(|_| bad_request("Status must be pending, approved, or rejected"))
}

fn people(value: i64) -> Result<u32, AppError> {
    u32::try_from(value)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| bad_request("Number of people must be at least 1"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfoPayload {
    pub number_of_people: Option<i64>,
    pub event_date: Option<String>,
}

impl EventInfoPayload {
    fn into_event_info(self) -> Result<EventInfo, AppError> {
        let number_of_people = people(required(
            self.number_of_people,
            "Number of people is required",
        )?)?;
        let event_date = parse_event_date(&required_text(self.event_date, "Event date is required")?)?;
        Ok(EventInfo {
            number_of_people,
            event_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemPayload {
    pub recipe_id: Option<String>,
    pub recipe_name: Option<String>,
    #[serde(rename = "type")]
    pub recipe_type: Option<String>,
    pub servings: Option<i64>,
    pub price_per_serving: Option<Decimal>,
    pub subtotal: Option<Decimal>,
}

impl QuoteItemPayload {
    fn into_item(self) -> Result<QuoteItem, AppError> {
        let recipe_name = required_text(self.recipe_name, "Recipe name is required")?;
        let recipe_type = required_text(self.recipe_type, "Recipe type is required")?;
        let servings = u32::try_from(required(self.servings, "Servings is required")?)
            .ok()
            .filter(|s| *s >= 1)
            .ok_or_else(|| bad_request("Servings must be at least 1"))?;
        let price_per_serving = non_negative(
            required(self.price_per_serving, "Price per serving is required")?,
            "Price per serving cannot be negative",
        )?;
        if price_per_serving > MAX_AMOUNT {
            return Err(bad_request("Price per serving cannot exceed 1000000000"));
        }
        if let Some(subtotal) = self.subtotal {
            non_negative(subtotal, "Subtotal cannot be negative")?;
        }
        let subtotal = price_per_serving
            .checked_mul(Decimal::from(servings))
            .ok_or_else(|| bad_request("Item subtotal is too large"))?;

        Ok(QuoteItem {
            recipe_id: self.recipe_id.filter(|id| !id.is_empty()),
            recipe_name,
            recipe_type,
            servings,
            price_per_serving,
            subtotal,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPayload {
    pub subtotal: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total: Option<Decimal>,
}

fn check_percentages(
    discount: Option<Decimal>,
    tax: Option<Decimal>,
) -> Result<(), AppError> {
    check_percentage(discount, Decimal::ONE_HUNDRED, "Discount percentage")
        .and_then(|_| check_percentage(tax, MAX_PERCENTAGE, "Tax percentage"))
        .map_err(|m| bad_request(&m))
}

/// Body of `POST /api/quotes`. Every field is optional at the parsing
/// level so the first missing one can be named in the response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub number: Option<String>,
    #[serde(alias = "client")]
    pub client_id: Option<String>,
    pub event_info: Option<EventInfoPayload>,
    pub items: Option<Vec<QuoteItemPayload>>,
    pub pricing: Option<PricingPayload>,
    pub total: Option<Decimal>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl CreateQuoteRequest {
    pub fn into_new_quote(self) -> Result<NewQuote, AppError> {
        let number = required_text(self.number, "Quote number is required")?;
        let client_id = required_text(self.client_id, "Client is required")?;
        let event_info = required(self.event_info, "Event information is required")?.into_event_info()?;

        let items = required(self.items, "Items are required")?;
        if items.is_empty() {
            return Err(bad_request("At least one item is required"));
        }
        let items = items
            .into_iter()
            .map(QuoteItemPayload::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        let pricing = required(self.pricing, "Pricing information is required")?;
        non_negative(
            required(pricing.subtotal, "Subtotal is required")?,
            "Subtotal cannot be negative",
        )?;
        non_negative(
            required(pricing.tax_amount, "Tax amount is required")?,
            "Tax amount cannot be negative",
        )?;
        let pricing_total = non_negative(
            required(pricing.total, "Total is required")?,
            "Total cannot be negative",
        )?;
        check_percentages(pricing.discount_percentage, pricing.tax_percentage)?;

        let status = match self.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => QuoteStatus::Pending,
        };

        Ok(NewQuote {
            number,
            client_id,
            event_info,
            items,
            discount_percentage: pricing.discount_percentage.unwrap_or_default(),
            tax_percentage: pricing.tax_percentage,
            supplied_total: Some(self.total.unwrap_or(pricing_total)),
            status,
            notes: self.notes,
            date: self.date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    pub number: Option<String>,
    #[serde(alias = "client")]
    pub client_id: Option<String>,
    pub event_info: Option<EventInfoPayload>,
    pub status: Option<String>,
    pub discount_percentage: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl UpdateQuoteRequest {
    pub fn into_patch(self) -> Result<QuotePatch, AppError> {
        check_percentages(self.discount_percentage, self.tax_percentage)?;

        Ok(QuotePatch {
            number: self.number,
            client_id: self.client_id.map(|id| id.trim().to_string()),
            event_info: self.event_info.map(EventInfoPayload::into_event_info).transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            discount_percentage: self.discount_percentage,
            tax_percentage: self.tax_percentage,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl QuoteQuery {
    pub fn into_filter(self) -> Result<QuoteFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(parse_status)
            .transpose()?;
        Ok(QuoteFilter {
            search: self.search,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub recipe_id: String,
    pub servings: Option<i64>,
}

/// Body of the preview and build endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildQuoteRequest {
    #[serde(alias = "client")]
    pub client_id: Option<String>,
    pub event_date: Option<String>,
    pub number_of_people: Option<i64>,
    pub discount_percentage: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default, alias = "items")]
    pub selections: Vec<SelectionPayload>,
    pub indirect_percentage: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    #[serde(default)]
    pub strict: bool,
}

impl BuildQuoteRequest {
    pub fn costing_options(&self) -> Result<CostingOptions, AppError> {
        costing_options(self.indirect_percentage, self.profit_margin, self.strict)
    }

    pub fn into_draft(self) -> Result<QuoteDraft, AppError> {
        let event_date = self
            .event_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(parse_event_date)
            .transpose()?;
        let number_of_people = self.number_of_people.map(people).transpose()?;

        Ok(QuoteDraft {
            client_id: self.client_id,
            event_date,
            number_of_people,
            discount_percentage: self.discount_percentage.unwrap_or_default(),
            tax_percentage: self.tax_percentage,
            notes: self.notes,
            selections: self
                .selections
                .into_iter()
                .map(|s| Selection {
                    recipe_id: s.recipe_id,
                    // Negative counts fall through to the zero-servings check.
                    servings: s.servings.map(|n| u32::try_from(n).unwrap_or(0)),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub number_of_people: u32,
    pub items: Vec<QuoteItem>,
    pub pricing: Pricing,
    pub unresolved_ingredients: Vec<String>,
}

impl From<PricedSelection> for PreviewResponse {
    fn from(priced: PricedSelection) -> Self {
        Self {
            number_of_people: priced.number_of_people,
            items: priced.items,
            pricing: priced.pricing,
            unresolved_ingredients: priced.unresolved_ingredients,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub id: String,
    pub number: String,
    pub client_id: String,
    pub client_name: String,
    pub event_info: EventInfo,
    pub items: Vec<QuoteItem>,
    pub pricing: Pricing,
    pub total: Decimal,
    pub date: DateTime<Utc>,
    pub status: QuoteStatus,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            id: quote.id,
            number: quote.number,
            client_id: quote.client_id,
            client_name: quote.client_name,
            event_info: quote.event_info,
            items: quote.items,
            pricing: quote.pricing,
            total: quote.total,
            date: quote.date,
            status: quote.status,
            notes: quote.notes,
            created_by: quote.created_by,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(e) => e.to_string(),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "number": "QT-000123",
            "clientId": "c1",
            "eventInfo": { "numberOfPeople": 10, "eventDate": "2025-07-01" },
            "items": [{
                "recipeName": "Mojito",
                "type": "cocktail",
                "servings": 10,
                "pricePerServing": 4.5,
                "subtotal": 45.0
            }],
            "pricing": { "subtotal": 45.0, "taxAmount": 6.75, "total": 51.75 },
            "total": 51.75
        })
    }

    fn parse(body: serde_json::Value) -> Result<NewQuote, AppError> {
        serde_json::from_value::<CreateQuoteRequest>(body)
            .unwrap()
            .into_new_quote()
    }

    #[test]
    fn valid_body_converts() {
        let quote = parse(valid_body()).unwrap();
        assert_eq!(quote.number, "QT-000123");
        assert_eq!(quote.items[0].subtotal, Decimal::new(45, 0));
        assert_eq!(quote.status, QuoteStatus::Pending);
        assert_eq!(quote.event_info.event_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
    }

    #[test]
    fn first_missing_field_is_named() {
        let cases = [
            ("number", "Quote number is required"),
            ("clientId", "Client is required"),
            ("eventInfo", "Event information is required"),
            ("items", "Items are required"),
            ("pricing", "Pricing information is required"),
        ];
        for (field, expected) in cases {
            let mut body = valid_body();
            body.as_object_mut().unwrap().remove(field);
            assert_eq!(message(parse(body).unwrap_err()), expected, "field {}", field);
        }
    }

    #[test]
    fn number_is_reported_before_client() {
        let body = json!({ "items": [] });
        assert_eq!(message(parse(body).unwrap_err()), "Quote number is required");
    }

    #[test]
    fn nested_fields_are_checked_in_order() {
        let mut body = valid_body();
        body["items"] = json!([]);
        assert_eq!(message(parse(body).unwrap_err()), "At least one item is required");

        let mut body = valid_body();
        body["eventInfo"] = json!({ "eventDate": "2025-07-01" });
        assert_eq!(message(parse(body).unwrap_err()), "Number of people is required");

        let mut body = valid_body();
        body["items"][0]["servings"] = json!(0);
        assert_eq!(message(parse(body).unwrap_err()), "Servings must be at least 1");

        let mut body = valid_body();
        body["pricing"] = json!({ "subtotal": 45.0, "total": 51.75 });
        assert_eq!(message(parse(body).unwrap_err()), "Tax amount is required");
    }

    #[test]
    fn client_alias_is_accepted() {
        let mut body = valid_body();
        let client = body.as_object_mut().unwrap().remove("clientId").unwrap();
        body["client"] = client;
        assert_eq!(parse(body).unwrap().client_id, "c1");
    }

    #[test]
    fn event_date_accepts_timestamps() {
        assert_eq!(
            parse_event_date("2025-07-01T18:30:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert!(parse_event_date("next friday").is_err());
    }

    #[test]
    fn quote_query_ignores_all_status() {
        let filter = QuoteQuery {
            search: None,
            status: Some("all".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.status, None);

        let bad = QuoteQuery {
            search: None,
            status: Some("archived".into()),
        }
        .into_filter();
        assert!(bad.is_err());
    }
}
