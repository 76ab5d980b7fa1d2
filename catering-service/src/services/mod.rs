//! Business logic for the catering service.
//!
//! `costing`, `quote_builder`, `units` and `scaling` are pure; `quotes`
//! coordinates them with the store.

pub mod costing;
mod database;
pub mod error;
mod jwt;
pub mod quote_builder;
pub mod quotes;
pub mod scaling;
pub mod seed;
pub mod store;
pub mod units;

pub use database::MongoDb;
pub use error::ServiceError;
pub use jwt::{JwtService, SessionClaims};
pub use quotes::QuoteService;
pub use store::{InMemoryStore, Store};
