use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Client, Ingredient, Quote, Recipe, User};
use crate::services::error::ServiceError;
use crate::services::store::{
    recipe_search_document, ClientRepository, IngredientFilter, IngredientRepository,
    QuoteFilter, QuoteRepository, RecipeRepository, Store, UserRepository,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for catering-service");

        let quote_number = IndexModel::builder()
            .keys(doc! { "number": 1 })
            .options(
                IndexOptions::builder()
                    .name("quote_number_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.quotes().create_index(quote_number, None).await.map_err(|e| {
            tracing::error!("Failed to create number index on quotes collection: {}", e);
            AppError::from(e)
        })?;

        let quote_date = IndexModel::builder()
            .keys(doc! { "date": -1 })
            .options(IndexOptions::builder().name("quote_date".to_string()).build())
            .build();
        self.quotes().create_index(quote_date, None).await?;

        let google_id = IndexModel::builder()
            .keys(doc! { "googleId": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_google_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users().create_index(google_id, None).await.map_err(|e| {
            tracing::error!("Failed to create googleId index on users collection: {}", e);
            AppError::from(e)
        })?;

        let ingredient_name = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().name("ingredient_name".to_string()).build())
            .build();
        self.ingredients().create_index(ingredient_name, None).await?;

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    pub fn ingredients(&self) -> Collection<Ingredient> {
        self.db.collection("ingredients")
    }

    pub fn recipes(&self) -> Collection<Recipe> {
        self.db.collection("recipes")
    }

    pub fn clients(&self) -> Collection<Client> {
        self.db.collection("clients")
    }

    pub fn quotes(&self) -> Collection<Quote> {
        self.db.collection("quotes")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

async fn find_all<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
) -> Result<Vec<T>, ServiceError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).build();
    let cursor = collection.find(filter, options).await?;
    Ok(cursor.try_collect().await?)
}

#[async_trait]
impl IngredientRepository for MongoDb {
    async fn list_ingredients(&self, filter: &IngredientFilter) -> Result<Vec<Ingredient>, ServiceError> {
        find_all(&self.ingredients(), filter.to_document(), doc! { "name": 1 }).await
    }

    async fn get_ingredient(&self, id: &str) -> Result<Option<Ingredient>, ServiceError> {
        Ok(self.ingredients().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), ServiceError> {
        self.ingredients().insert_one(ingredient, None).await?;
        Ok(())
    }

    async fn replace_ingredient(&self, ingredient: &Ingredient) -> Result<bool, ServiceError> {
        let result = self
            .ingredients()
            .replace_one(doc! { "_id": ingredient.id.as_str() }, ingredient, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_ingredient(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self.ingredients().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl RecipeRepository for MongoDb {
    async fn list_recipes(&self, search: Option<&str>) -> Result<Vec<Recipe>, ServiceError> {
        find_all(&self.recipes(), recipe_search_document(search), doc! { "name": 1 }).await
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>, ServiceError> {
        Ok(self.recipes().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_recipes(&self, ids: &[String]) -> Result<Vec<Recipe>, ServiceError> {
        find_all(&self.recipes(), doc! { "_id": { "$in": ids.to_vec() } }, doc! { "name": 1 }).await
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), ServiceError> {
        self.recipes().insert_one(recipe, None).await?;
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for MongoDb {
    async fn list_clients(&self) -> Result<Vec<Client>, ServiceError> {
        find_all(&self.clients(), Document::new(), doc! { "name": 1 }).await
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(self.clients().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError> {
        self.clients().insert_one(client, None).await?;
        Ok(())
    }
}

#[async_trait]
impl QuoteRepository for MongoDb {
    async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<Quote>, ServiceError> {
        find_all(&self.quotes(), filter.to_document(), doc! { "date": -1, "number": -1 }).await
    }

    async fn get_quote(&self, id: &str) -> Result<Option<Quote>, ServiceError> {
        Ok(self.quotes().find_one(doc! { "_id": id }, None).await?)
    }

    async fn quote_number_exists(&self, number: &str) -> Result<bool, ServiceError> {
        let count = self
            .quotes()
            .count_documents(doc! { "number": number }, None)
            .await?;
        Ok(count > 0)
    }

    async fn insert_quote(&self, quote: &Quote) -> Result<(), ServiceError> {
        match self.quotes().insert_one(quote, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::DuplicateNumber),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_quote(&self, quote: &Quote) -> Result<bool, ServiceError> {
        match self
            .quotes()
            .replace_one(doc! { "_id": quote.id.as_str() }, quote, None)
            .await
        {
            Ok(result) => Ok(result.matched_count > 0),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::DuplicateNumber),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_quote(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self.quotes().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl UserRepository for MongoDb {
    async fn upsert_google_user(
        &self,
        google_id: &str,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, ServiceError> {
        let now = BsonDateTime::from_chrono(Utc::now());
        let update = doc! {
            "$set": {
                "email": email,
                "name": name,
                "picture": picture,
                "updatedAt": now,
            },
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "googleId": google_id,
                "createdAt": now,
            },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.users()
            .find_one_and_update(doc! { "googleId": google_id }, update, options)
            .await?
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("User upsert returned no document")))
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }
}

#[async_trait]
impl Store for MongoDb {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }
}
