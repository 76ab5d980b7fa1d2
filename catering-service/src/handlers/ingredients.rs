use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::ingredients::{
    CreateIngredientRequest, IngredientQuery, IngredientResponse, UpdateIngredientRequest,
};
use crate::dtos::MessageResponse;
use crate::services::store::{IngredientFilter, IngredientRepository};
use crate::services::ServiceError;
use crate::startup::AppState;
use crate::utils::{QueryParams, ValidatedJson};

pub async fn list_ingredients(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IngredientQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = IngredientFilter {
        search: query.search,
        category: query.category,
    };
    let ingredients = state.store.list_ingredients(&filter).await?;
    Ok(Json(
        ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient = state
        .store
        .get_ingredient(&id)
        .await?
        .ok_or(ServiceError::NotFound("Ingredient"))?;
    Ok(Json(IngredientResponse::from(ingredient)))
}

#[tracing::instrument(skip(state, req), fields(ingredient_name = %req.name))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateIngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient = req.into_ingredient();
    state.store.insert_ingredient(&ingredient).await?;
    tracing::info!(ingredient_id = %ingredient.id, "Ingredient created");
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient))))
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateIngredientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut ingredient = state
        .store
        .get_ingredient(&id)
        .await?
        .ok_or(ServiceError::NotFound("Ingredient"))?;

    req.apply(&mut ingredient);

    if !state.store.replace_ingredient(&ingredient).await? {
        return Err(ServiceError::NotFound("Ingredient").into());
    }
    tracing::info!(ingredient_id = %ingredient.id, "Ingredient updated");
    Ok(Json(IngredientResponse::from(ingredient)))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_ingredient(&id).await? {
        return Err(ServiceError::NotFound("Ingredient").into());
    }
    tracing::info!(ingredient_id = %id, "Ingredient deleted");
    Ok(Json(MessageResponse::new("Ingredient deleted successfully")))
}
