use service_core::error::AppError;
use thiserror::Error;

use crate::services::costing::CostingError;
use crate::services::quote_builder::QuoteError;
use crate::services::scaling::ScaleError;
use crate::services::units::UnitError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0} is required")]
    MissingRequiredField(&'static str),

    #[error("At least one recipe must be selected")]
    EmptySelection,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Approved quotes cannot be edited or deleted")]
    QuoteLocked,

    #[error("Quote number already exists")]
    DuplicateNumber,

    #[error("{0}")]
    Validation(String),
}

impl From<QuoteError> for ServiceError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::EmptySelection => ServiceError::EmptySelection,
            QuoteError::MissingRequiredField(field) => ServiceError::MissingRequiredField(field),
            QuoteError::RecipeNotFound(_) => ServiceError::NotFound("Recipe"),
            QuoteError::Costing(e) => e.into(),
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

impl From<CostingError> for ServiceError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::IngredientNotFound(name) => ServiceError::IngredientNotFound(name),
            other @ CostingError::OutOfRange(_) => ServiceError::Validation(other.to_string()),
        }
    }
}

impl From<UnitError> for ServiceError {
    fn from(err: UnitError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<ScaleError> for ServiceError {
    fn from(err: ScaleError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::IngredientNotFound(name) => {
                AppError::NotFound(anyhow::anyhow!("Ingredient not found: {}", name))
            }
            other @ (ServiceError::MissingRequiredField(_)
            | ServiceError::EmptySelection
            | ServiceError::QuoteLocked
            | ServiceError::DuplicateNumber
            | ServiceError::Validation(_)) => AppError::BadRequest(anyhow::anyhow!(other.to_string())),
        }
    }
}
