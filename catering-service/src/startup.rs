//! Application startup and lifecycle management.

use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{CateringConfig, StoreBackend};
use crate::handlers;
use crate::middleware::require_auth;
use crate::services::quote_builder::BuilderDefaults;
use crate::services::seed::demo_catalog;
use crate::services::{InMemoryStore, JwtService, MongoDb, QuoteService, Store};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CateringConfig,
    pub store: Arc<dyn Store>,
    pub jwt: JwtService,
    pub quotes: QuoteService,
}

impl AppState {
    pub fn new(config: CateringConfig, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;
        let defaults = BuilderDefaults {
            tax_percentage: config.pricing.tax_percentage,
            number_of_people: config.pricing.default_number_of_people,
        };
        let quotes = QuoteService::new(store.clone(), defaults);

        Ok(Self {
            config,
            store,
            jwt,
            quotes,
        })
    }
}

/// Opens the configured store backend.
pub async fn connect_store(config: &CateringConfig) -> Result<Arc<dyn Store>, AppError> {
    match config.store.backend {
        StoreBackend::Mongo => {
            let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            if config.store.seed {
                tracing::info!("Using in-memory store with demo catalog");
                Ok(Arc::new(InMemoryStore::with_seed(demo_catalog())))
            } else {
                tracing::info!("Using empty in-memory store");
                Ok(Arc::new(InMemoryStore::new()))
            }
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/quotes",
            get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote),
        )
        .route("/api/quotes/stats", get(handlers::quotes::quote_stats))
        .route("/api/quotes/preview", post(handlers::quotes::preview_quote))
        .route("/api/quotes/build", post(handlers::quotes::build_quote))
        .route(
            "/api/quotes/:id",
            get(handlers::quotes::get_quote)
                .put(handlers::quotes::update_quote)
                .delete(handlers::quotes::delete_quote),
        )
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route("/api/clients/:id", get(handlers::clients::get_client))
        .route(
            "/api/recipes",
            get(handlers::recipes::list_recipes).post(handlers::recipes::create_recipe),
        )
        .route("/api/recipes/:id", get(handlers::recipes::get_recipe))
        .route(
            "/api/recipes/:id/costing",
            get(handlers::recipes::recipe_costing),
        )
        .route("/api/recipes/:id/scale", get(handlers::recipes::scale))
        .route(
            "/api/ingredients",
            get(handlers::ingredients::list_ingredients)
                .post(handlers::ingredients::create_ingredient),
        )
        .route(
            "/api/ingredients/:id",
            get(handlers::ingredients::get_ingredient)
                .put(handlers::ingredients::update_ingredient)
                .delete(handlers::ingredients::delete_ingredient),
        )
        .route("/api/conversions", get(handlers::conversions::convert))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/auth/google", get(handlers::auth::google_login))
        .route("/auth/google/callback", get(handlers::auth::google_callback))
        .route("/auth/failure", get(handlers::auth::auth_failure))
        .route("/auth/verify", get(handlers::auth::verify))
        .merge(api_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect the store and bind the listener (port 0 picks a free port).
    pub async fn build(config: CateringConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        let state = AppState::new(config, store)?;

        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            service = %state.config.service_name,
            port = port,
            backend = ?state.config.store.backend,
            "Catering service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
