use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(QuoteStatus::Pending),
            "approved" => Ok(QuoteStatus::Approved),
            "rejected" => Ok(QuoteStatus::Rejected),
            _ => Err(format!("Invalid quote status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub number_of_people: u32,
    pub event_date: NaiveDate,
}

/// Snapshot of a recipe's price at the time the quote was written. Later
/// recipe or ingredient edits never reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    pub recipe_name: String,
    #[serde(rename = "type")]
    pub recipe_type: String,
    pub servings: u32,
    pub price_per_serving: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(rename = "_id")]
    pub id: String,
    pub number: String,
    pub client_id: String,
    pub client_name: String,
    pub event_info: EventInfo,
    pub items: Vec<QuoteItem>,
    pub pricing: Pricing,
    pub total: Decimal,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: QuoteStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(
        number: String,
        client_id: String,
        client_name: String,
        event_info: EventInfo,
        items: Vec<QuoteItem>,
        pricing: Pricing,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            number,
            client_id,
            client_name,
            event_info,
            items,
            total: pricing.total,
            pricing,
            date: now,
            status: QuoteStatus::Pending,
            notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Approved quotes accept status changes only.
    pub fn is_locked(&self) -> bool {
        self.status == QuoteStatus::Approved
    }

    pub fn set_pricing(&mut self, pricing: Pricing) {
        self.total = pricing.total;
        self.pricing = pricing;
    }
}
