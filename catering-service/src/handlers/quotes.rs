use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::quotes::{
    BuildQuoteRequest, CreateQuoteRequest, PreviewResponse, QuoteQuery, QuoteResponse,
    UpdateQuoteRequest,
};
use crate::dtos::MessageResponse;
use crate::middleware::AuthUser;
use crate::startup::AppState;
use crate::utils::{JsonBody, QueryParams};

fn creator(user: Option<AuthUser>) -> Option<String> {
    user.map(|AuthUser(claims)| claims.id)
}

pub async fn list_quotes(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<QuoteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.into_filter()?;
    let quotes = state.quotes.list(&filter).await?;
    Ok(Json(
        quotes.into_iter().map(QuoteResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn quote_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.quotes.stats().await?))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quote = state.quotes.get(&id).await?;
    Ok(Json(QuoteResponse::from(quote)))
}

pub async fn create_quote(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    JsonBody(req): JsonBody<CreateQuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = req.into_new_quote()?;
    let quote = state.quotes.create(input, creator(user)).await?;
    Ok((StatusCode::CREATED, Json(QuoteResponse::from(quote))))
}

#[tracing::instrument(skip(state, req), fields(selections = req.selections.len()))]
pub async fn preview_quote(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BuildQuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let options = req.costing_options()?;
    let draft = req.into_draft()?;
    let priced = state.quotes.preview(&draft, &options).await?;
    Ok(Json(PreviewResponse::from(priced)))
}

#[tracing::instrument(skip(state, user, req), fields(selections = req.selections.len()))]
pub async fn build_quote(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    JsonBody(req): JsonBody<BuildQuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let options = req.costing_options()?;
    let draft = req.into_draft()?;
    let quote = state.quotes.build(&draft, &options, creator(user)).await?;
    Ok((StatusCode::CREATED, Json(QuoteResponse::from(quote))))
}

pub async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateQuoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patch = req.into_patch()?;
    let quote = state.quotes.update(&id, patch).await?;
    tracing::info!(quote_id = %quote.id, "Quote updated");
    Ok(Json(QuoteResponse::from(quote)))
}

pub async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.quotes.delete(&id).await?;
    tracing::info!(quote_id = %id, "Quote deleted");
    Ok(Json(MessageResponse::new("Quote deleted successfully")))
}
