pub mod auth;
pub mod clients;
pub mod conversions;
pub mod health;
pub mod ingredients;
pub mod quotes;
pub mod recipes;

pub use health::{health_check, metrics_endpoint, readiness_check};
