use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::clients::{ClientResponse, CreateClientRequest};
use crate::services::store::ClientRepository;
use crate::services::ServiceError;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

pub async fn list_clients(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let clients = state.store.list_clients().await?;
    Ok(Json(
        clients.into_iter().map(ClientResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .store
        .get_client(&id)
        .await?
        .ok_or(ServiceError::NotFound("Client"))?;
    Ok(Json(ClientResponse::from(client)))
}

#[tracing::instrument(skip(state, req), fields(client_name = %req.name))]
pub async fn create_client(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client = req.into_client();
    state.store.insert_client(&client).await?;
    tracing::info!(client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}
