pub mod validation;

pub use validation::{JsonBody, QueryParams, ValidatedJson};
