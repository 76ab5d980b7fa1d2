use axum::{response::IntoResponse, Json};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::services::{units, ServiceError};
use crate::utils::QueryParams;

#[derive(Debug, Deserialize)]
pub struct ConversionQuery {
    pub value: Decimal,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub value: Decimal,
    pub from: String,
    pub to: String,
    pub result: Decimal,
}

pub async fn convert(
    QueryParams(query): QueryParams<ConversionQuery>,
) -> Result<impl IntoResponse, AppError> {
    let result = units::convert(query.value, &query.from, &query.to).map_err(ServiceError::from)?;

    Ok(Json(ConversionResponse {
        value: query.value,
        from: query.from,
        to: query.to,
        result: result.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero),
    }))
}
