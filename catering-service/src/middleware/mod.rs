pub mod auth;

pub use auth::{bearer_token, require_auth, AuthUser};
