use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::recipes::{CostingQuery, CreateRecipeRequest, RecipeQuery, RecipeResponse, ScaleQuery};
use crate::models::Recipe;
use crate::services::costing::cost_recipe;
use crate::services::scaling::scale_recipe;
use crate::services::store::{IngredientFilter, IngredientRepository, RecipeRepository};
use crate::services::ServiceError;
use crate::startup::AppState;
use crate::utils::{QueryParams, ValidatedJson};

async fn load_recipe(state: &AppState, id: &str) -> Result<Recipe, ServiceError> {
    state
        .store
        .get_recipe(id)
        .await?
        .ok_or(ServiceError::NotFound("Recipe"))
}

pub async fn list_recipes(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RecipeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let recipes = state.store.list_recipes(query.search.as_deref()).await?;
    Ok(Json(
        recipes.into_iter().map(RecipeResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = load_recipe(&state, &id).await?;
    Ok(Json(RecipeResponse::from(recipe)))
}

#[tracing::instrument(skip(state, req), fields(recipe_name = %req.name))]
pub async fn create_recipe(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = req.into_recipe();
    state.store.insert_recipe(&recipe).await?;
    tracing::info!(recipe_id = %recipe.id, category = %recipe.category, "Recipe created");
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
}

/// Cost breakdown and suggested price for one recipe.
pub async fn recipe_costing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<CostingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let options = query.options()?;
    let recipe = load_recipe(&state, &id).await?;
    let catalog = state
        .store
        .list_ingredients(&IngredientFilter::default())
        .await?;

    let breakdown = cost_recipe(&recipe, &catalog, &options).map_err(ServiceError::from)?;
    Ok(Json(breakdown))
}

pub async fn scale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<ScaleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = load_recipe(&state, &id).await?;
    let scaled = scale_recipe(&recipe, query.servings).map_err(ServiceError::from)?;
    Ok(Json(scaled))
}
