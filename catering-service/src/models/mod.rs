pub mod client;
pub mod ingredient;
pub mod quote;
pub mod recipe;
pub mod user;

pub use client::Client;
pub use ingredient::Ingredient;
pub use quote::{EventInfo, Pricing, Quote, QuoteItem, QuoteStatus};
pub use recipe::{Recipe, RecipeCategory, RecipeIngredientLine};
pub use user::User;
