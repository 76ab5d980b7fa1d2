use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, parse_env, Environment};
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

#[derive(Debug, Clone, Deserialize)]
pub struct CateringConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub google: GoogleOAuthConfig,
    pub pricing: PricingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Load the demo catalog into the in-memory store at startup.
    pub seed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub tax_percentage: Decimal,
    pub default_number_of_people: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub require_auth: bool,
}

impl CateringConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::current()?;
        let is_prod = environment.is_prod();

        let store_backend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let config = CateringConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("catering-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),
            store: StoreConfig {
                backend: store_backend,
                seed: parse_env("STORE_SEED", Some("false"), is_prod)?,
            },
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("catering"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-only-jwt-secret"), is_prod)?,
                expiry_days: parse_env("JWT_EXPIRY_DAYS", Some("7"), is_prod)?,
            },
            google: GoogleOAuthConfig {
                client_id: get_env("GOOGLE_CLIENT_ID", Some(""), is_prod)?,
                client_secret: get_env("GOOGLE_CLIENT_SECRET", Some(""), is_prod)?,
                redirect_uri: get_env(
                    "GOOGLE_REDIRECT_URI",
                    Some("http://localhost:5000/auth/google/callback"),
                    is_prod,
                )?,
                auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
                token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
                userinfo_url: env::var("GOOGLE_USERINFO_URL")
                    .unwrap_or_else(|_| GOOGLE_USERINFO_URL.to_string()),
            },
            pricing: PricingConfig {
                tax_percentage: parse_env("DEFAULT_TAX_PERCENTAGE", Some("15"), is_prod)?,
                default_number_of_people: parse_env("DEFAULT_NUMBER_OF_PEOPLE", Some("50"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: parse_origins(&get_env("ALLOWED_ORIGINS", Some(""), is_prod)?),
                require_auth: parse_env("REQUIRE_AUTH", Some("true"), is_prod)?,
            },
        };

        if config.jwt.expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_DAYS must be positive"
            )));
        }
        if config.jwt.secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!("JWT_SECRET must not be empty")));
        }

        Ok(config)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
