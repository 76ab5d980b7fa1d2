use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::{auth::InvalidTokenResponse, MessageResponse};
use crate::services::SessionClaims;
use crate::startup::AppState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects `/api` requests without a valid session token. Validated claims
/// are stored in the request extensions for [`AuthUser`].
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if !state.config.security.require_auth {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("No token provided")),
        )
            .into_response();
    };

    match state.jwt.validate(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            (
                StatusCode::UNAUTHORIZED,
                Json(InvalidTokenResponse {
                    valid: false,
                    message: "Invalid token".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// The signed-in user. Use `Option<AuthUser>` where auth may be disabled.
pub struct AuthUser(pub SessionClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<MessageResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<SessionClaims>().ok_or((
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("No token provided")),
        ))?;

        Ok(AuthUser(claims.clone()))
    }
}
