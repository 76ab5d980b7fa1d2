//! Persistence seams.
//!
//! Handlers and services only see these traits through `Arc<dyn Store>`.
//! [`crate::services::MongoDb`] backs them in production; [`InMemoryStore`]
//! backs tests and local demos.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, Document};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Client, Ingredient, Quote, QuoteStatus, Recipe, User};
use crate::services::error::ServiceError;
use crate::services::seed::SeedData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub search: Option<String>,
    pub status: Option<QuoteStatus>,
}

impl QuoteFilter {
    /// `search` matches the quote number or client name, ignoring case.
    pub fn matches(&self, quote: &Quote) -> bool {
        let search_ok = match non_blank(&self.search) {
            Some(term) => contains_ignore_case(&quote.number, term)
                || contains_ignore_case(&quote.client_name, term),
            None => true,
        };
        let status_ok = self.status.map_or(true, |status| quote.status == status);
        search_ok && status_ok
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(term) = non_blank(&self.search) {
            let pattern = regex_escape(term);
            filter.insert(
                "$or",
                vec![
                    doc! { "number": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "clientName": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        filter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl IngredientFilter {
    /// `search` matches name or brand; `category` must match exactly, ignoring case.
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        let search_ok = match non_blank(&self.search) {
            Some(term) => contains_ignore_case(&ingredient.name, term)
                || contains_ignore_case(&ingredient.brand, term),
            None => true,
        };
        let category_ok = match non_blank(&self.category) {
            Some(category) => ingredient
                .category
                .as_deref()
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(category)),
            None => true,
        };
        search_ok && category_ok
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(term) = non_blank(&self.search) {
            let pattern = regex_escape(term);
            filter.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "brand": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }
        if let Some(category) = non_blank(&self.category) {
            let pattern = format!("^{}$", regex_escape(category));
            filter.insert("category", doc! { "$regex": pattern, "$options": "i" });
        }
        filter
    }
}

pub(crate) fn recipe_search_document(search: Option<&str>) -> Document {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => doc! { "name": { "$regex": regex_escape(term), "$options": "i" } },
        None => Document::new(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Escapes regex metacharacters so user input is matched literally.
pub(crate) fn regex_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
pub trait IngredientRepository: Send + Sync {
    async fn list_ingredients(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, ServiceError>;
    async fn get_ingredient(&self, id: &str) -> Result<Option<Ingredient>, ServiceError>;
    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), ServiceError>;
    /// Returns `false` when no ingredient has that id.
    async fn replace_ingredient(&self, ingredient: &Ingredient) -> Result<bool, ServiceError>;
    async fn delete_ingredient(&self, id: &str) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<Recipe>, ServiceError>;
    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, ServiceError>;
    async fn find_recipes(&self, ids: &[String]) -> Result<Vec<Recipe>, ServiceError>;
    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list_clients(&self) -> Result<Vec<Client>, ServiceError>;
    async fn get_client(&self, id: &str) -> Result<Option<Client>, ServiceError>;
    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Newest first.
    async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<Quote>, ServiceError>;
    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, ServiceError>;
    async fn quote_number_exists(&self, number: &str) -> Result<bool, ServiceError>;
    /// Fails with [`ServiceError::DuplicateNumber`] when the number is taken.
    async fn insert_quote(&self, quote: &Quote) -> Result<(), ServiceError>;
    async fn replace_quote(&self, quote: &Quote) -> Result<bool, ServiceError>;
    async fn delete_quote(&self, id: &str) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the user on first login, otherwise refreshes email, name and picture.
    async fn upsert_google_user(
        &self,
        google_id: &str,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, ServiceError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError>;
}

#[async_trait]
pub trait Store:
    IngredientRepository + RecipeRepository + ClientRepository + QuoteRepository + UserRepository
{
    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// Process-local store kept in hash maps.
#[derive(Default)]
pub struct InMemoryStore {
    ingredients: RwLock<HashMap<String, Ingredient>>,
    recipes: RwLock<HashMap<String, Recipe>>,
    clients: RwLock<HashMap<String, Client>>,
    quotes: RwLock<HashMap<String, Quote>>,
    users: RwLock<HashMap<String, User>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, ServiceError> {
    lock.read()
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("In-memory store lock poisoned: {}", e)))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, ServiceError> {
    lock.write()
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("In-memory store lock poisoned: {}", e)))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: SeedData) -> Self {
        let store = Self::new();
        if let Ok(mut ingredients) = store.ingredients.write() {
            ingredients.extend(seed.ingredients.into_iter().map(|i| (i.id.clone(), i)));
        }
        if let Ok(mut recipes) = store.recipes.write() {
            recipes.extend(seed.recipes.into_iter().map(|r| (r.id.clone(), r)));
        }
        if let Ok(mut clients) = store.clients.write() {
            clients.extend(seed.clients.into_iter().map(|c| (c.id.clone(), c)));
        }
        store
    }
}

fn sorted_by_name<T: Clone>(items: impl Iterator<Item = T>, name: impl Fn(&T) -> String) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| name(item).to_lowercase());
    items
}

#[async_trait]
impl IngredientRepository for InMemoryStore {
    async fn list_ingredients(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, ServiceError> {
        let ingredients = read(&self.ingredients)?;
        Ok(sorted_by_name(
            ingredients.values().filter(|i| filter.matches(i)).cloned(),
            |i| i.name.clone(),
        ))
    }

    async fn get_ingredient(&self, id: &str) -> Result<Option<Ingredient>, ServiceError> {
        Ok(read(&self.ingredients)?.get(id).cloned())
    }

    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), ServiceError> {
        write(&self.ingredients)?.insert(ingredient.id.clone(), ingredient.clone());
        Ok(())
    }

    async fn replace_ingredient(&self, ingredient: &Ingredient) -> Result<bool, ServiceError> {
        let mut ingredients = write(&self.ingredients)?;
        match ingredients.get_mut(&ingredient.id) {
            Some(existing) => {
                *existing = ingredient.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ingredient(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(write(&self.ingredients)?.remove(id).is_some())
    }
}

#[async_trait]
impl RecipeRepository for InMemoryStore {
    async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<Recipe>, ServiceError> {
        let term = search.map(str::trim).filter(|t| !t.is_empty());
        let recipes = read(&self.recipes)?;
        Ok(sorted_by_name(
            recipes
                .values()
                .filter(|r| term.map_or(true, |t| contains_ignore_case(&r.name, t)))
                .cloned(),
            |r| r.name.clone(),
        ))
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, ServiceError> {
        Ok(read(&self.recipes)?.get(id).cloned())
    }

    async fn find_recipes(&self, ids: &[String]) -> Result<Vec<Recipe>, ServiceError> {
        let recipes = read(&self.recipes)?;
        Ok(ids.iter().filter_map(|id| recipes.get(id).cloned()).collect())
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), ServiceError> {
        write(&self.recipes)?.insert(recipe.id.clone(), recipe.clone());
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn list_clients(&self) -> Result<Vec<Client>, ServiceError> {
        let clients = read(&self.clients)?;
        Ok(sorted_by_name(clients.values().cloned(), |c| c.name.clone()))
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(read(&self.clients)?.get(id).cloned())
    }

    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError> {
        write(&self.clients)?.insert(client.id.clone(), client.clone());
        Ok(())
    }
}

#[async_trait]
impl QuoteRepository for InMemoryStore {
    async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<Quote>, ServiceError> {
        let quotes = read(&self.quotes)?;
        let mut matching: Vec<Quote> = quotes.values().filter(|q| filter.matches(q)).cloned().collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.number.cmp(&a.number)));
        Ok(matching)
    }

    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, ServiceError> {
        Ok(read(&self.quotes)?.get(id).cloned())
    }

    async fn quote_number_exists(&self, number: &str) -> Result<bool, ServiceError> {
        Ok(read(&self.quotes)?.values().any(|q| q.number == number))
    }

    async fn insert_quote(&self, quote: &Quote) -> Result<(), ServiceError> {
        let mut quotes = write(&self.quotes)?;
        if quotes.values().any(|q| q.number == quote.number) {
            return Err(ServiceError::DuplicateNumber);
        }
        quotes.insert(quote.id.clone(), quote.clone());
        Ok(())
    }

    async fn replace_quote(&self, quote: &Quote) -> Result<bool, ServiceError> {
        let mut quotes = write(&self.quotes)?;
        if quotes
            .values()
            .any(|q| q.id != quote.id && q.number == quote.number)
        {
            return Err(ServiceError::DuplicateNumber);
        }
        match quotes.get_mut(&quote.id) {
            Some(existing) => {
                *existing = quote.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_quote(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(write(&self.quotes)?.remove(id).is_some())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert_google_user(
        &self,
        google_id: &str,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, ServiceError> {
        let mut users = write(&self.users)?;
        if let Some(user) = users.values_mut().find(|u| u.google_id == google_id) {
            user.email = email.to_string();
            user.name = name.map(str::to_string);
            user.picture = picture.map(str::to_string);
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }

        let user = User::new(
            google_id.to_string(),
            email.to_string(),
            name.map(str::to_string),
            picture.map(str::to_string),
        );
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(read(&self.users)?.get(id).cloned())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
