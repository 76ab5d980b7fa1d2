use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::Deserialize;
use service_core::error::AppError;
use sha2::{Digest, Sha256};

use crate::dtos::auth::{
    AuthFailureResponse, GoogleCallbackQuery, InvalidTokenResponse, LoginResponse, UserResponse,
    VerifyResponse,
};
use crate::dtos::MessageResponse;
use crate::middleware::bearer_token;
use crate::services::store::UserRepository;
use crate::startup::AppState;
use crate::utils::QueryParams;

const STATE_COOKIE: &str = "oauth_state";
const VERIFIER_COOKIE: &str = "code_verifier";

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    /// `sub` on the v3 endpoint, `id` on v2.
    #[serde(alias = "id")]
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

fn short_lived_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(5))
        .build()
}

fn pkce_pair() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);

    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

    (verifier, challenge)
}

fn auth_failed() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("Authentication failed"))
}

pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let google = &state.config.google;
    let state_val = uuid::Uuid::new_v4().to_string();
    let (code_verifier, code_challenge) = pkce_pair();

    let url = reqwest::Url::parse_with_params(
        &google.auth_url,
        &[
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state_val.as_str()),
            ("code_challenge", code_challenge.as_str()),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid Google auth URL: {}", e)))?;

    let secure = state.config.environment.is_prod();
    let jar = jar
        .add(short_lived_cookie(STATE_COOKIE, state_val, secure))
        .add(short_lived_cookie(VERIFIER_COOKIE, code_verifier, secure));

    Ok((jar, Redirect::to(url.as_str()).into_response()))
}

pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    QueryParams(query): QueryParams<GoogleCallbackQuery>,
) -> Result<(CookieJar, Response), AppError> {
    if let Some(error) = query.error.as_deref() {
        tracing::warn!(error = %error, "Google sign-in was not completed");
        return Ok((jar, Redirect::to("/auth/failure").into_response()));
    }

    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value());
    if query.state.is_none() || stored_state != query.state.as_deref() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid OAuth state")));
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing authorization code")))?;
    let code_verifier = jar
        .get(VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing code verifier")))?;

    let google = &state.config.google;
    let client = reqwest::Client::new();
    let token_res = client
        .post(&google.token_url)
        .form(&[
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("code", code),
            ("code_verifier", code_verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", google.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to exchange Google code");
            auth_failed()
        })?;

    if !token_res.status().is_success() {
        let status = token_res.status();
        let body = token_res.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Google token exchange error");
        return Err(auth_failed());
    }

    let token_data: GoogleTokenResponse = token_res.json().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to parse Google token response");
        auth_failed()
    })?;

    let user_info: GoogleUserInfo = client
        .get(&google.userinfo_url)
        .bearer_auth(token_data.access_token)
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch Google user info");
            auth_failed()
        })?
        .json()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Google user info");
            auth_failed()
        })?;

    let user = state
        .store
        .upsert_google_user(
            &user_info.sub,
            &user_info.email,
            user_info.name.as_deref(),
            user_info.picture.as_deref(),
        )
        .await?;

    let token = state.jwt.issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in via Google");

    let jar = jar
        .remove(Cookie::from(STATE_COOKIE))
        .remove(Cookie::from(VERIFIER_COOKIE));

    let body = LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(user),
    };

    Ok((jar, Json(body).into_response()))
}

pub async fn auth_failure() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(AuthFailureResponse {
            success: false,
            message: "Authentication failed".to_string(),
        }),
    )
}

pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse::new("No token provided")),
        )
            .into_response();
    };

    match state.jwt.validate(token) {
        Ok(claims) => Json(VerifyResponse {
            valid: true,
            user: claims,
        })
        .into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Token verification failed");
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
