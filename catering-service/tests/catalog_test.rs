//! Clients, ingredients, recipes, costing and unit conversion over HTTP.

mod common;

use axum::http::StatusCode;
use catering_service::models::{Ingredient, Recipe, RecipeCategory, RecipeIngredientLine};
use catering_service::services::store::{IngredientRepository, RecipeRepository};
use catering_service::services::InMemoryStore;
use common::{assert_close, TestApp};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

#[tokio::test]
async fn client_can_be_created_and_fetched() {
    let app = TestApp::empty().await;

    let created = app
        .post_json(
            "/api/clients",
            &json!({ "name": "Acme Weddings", "email": "hello@acme.test", "phone": "555-0100" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_str().unwrap().to_string();

    let fetched = app.get(&format!("/api/clients/{}", id)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["name"], "Acme Weddings");
    assert_eq!(fetched.body["email"], "hello@acme.test");

    let listed = app.get("/api/clients").await;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn client_requires_name_and_valid_email() {
    let app = TestApp::empty().await;

    let nameless = app.post_json("/api/clients", &json!({ "name": "" })).await;
    assert_eq!(nameless.status, StatusCode::BAD_REQUEST);
    assert_eq!(nameless.body["message"], "Client name is required");

    let bad_email = app
        .post_json("/api/clients", &json!({ "name": "X", "email": "nope" }))
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_client_is_404() {
    let app = TestApp::empty().await;

    let response = app.get("/api/clients/missing").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Client not found");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::empty().await;
    let request = axum::http::Request::post("/api/clients")
        .header("authorization", format!("Bearer {}", app.token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn ingredient_lifecycle() {
    let app = TestApp::empty().await;

    let created = app
        .post_json(
            "/api/ingredients",
            &json!({
                "name": "Rum",
                "brand": "Bacardi",
                "category": "spirit",
                "packageSize": 750,
                "packageUnit": "ml",
                "packagePrice": 15
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_close(&created.body["unitCost"], 0.02);
    let id = created.body["id"].as_str().unwrap().to_string();

    let updated = app
        .put_json(
            &format!("/api/ingredients/{}", id),
            &json!({ "packagePrice": 30 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_close(&updated.body["unitCost"], 0.04);
    assert_eq!(updated.body["brand"], "Bacardi");

    let filtered = app.get("/api/ingredients?search=ru&category=spirit").await;
    assert_eq!(filtered.body.as_array().map(Vec::len), Some(1));

    let deleted = app.delete(&format!("/api/ingredients/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Ingredient deleted successfully");

    let again = app.delete(&format!("/api/ingredients/{}", id)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingredient_rejects_non_positive_package_size() {
    let app = TestApp::empty().await;

    let response = app
        .post_json(
            "/api/ingredients",
            &json!({
                "name": "Rum",
                "brand": "Bacardi",
                "packageSize": 0,
                "packageUnit": "ml",
                "packagePrice": 15
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingredient_rejects_out_of_range_amounts() {
    let app = TestApp::empty().await;

    let response = app
        .post_json(
            "/api/ingredients",
            &json!({
                "name": "Rum",
                "brand": "Bacardi",
                "packageSize": 0.0000001,
                "packageUnit": "oz",
                "packagePrice": 1e22
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["message"],
        "Package price cannot exceed 1000000000"
    );

    let tiny = app
        .post_json(
            "/api/ingredients",
            &json!({
                "name": "Rum",
                "brand": "Bacardi",
                "packageSize": 0.0000001,
                "packageUnit": "oz",
                "packagePrice": 15
            }),
        )
        .await;
    assert_eq!(tiny.status, StatusCode::BAD_REQUEST);
    assert_eq!(tiny.body["message"], "Package size must be at least 0.0001");

    let listed = app.get("/api/ingredients").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn stored_out_of_range_ingredient_keeps_catalog_usable() {
    let store = Arc::new(InMemoryStore::new());
    let rum = Ingredient::new(
        "Rum".into(),
        "Legacy".into(),
        Decimal::from_str("0.0000001").unwrap(),
        "oz".into(),
        Decimal::from_str("10000000000000000000000").unwrap(),
    );
    store.insert_ingredient(&rum).await.unwrap();
    let recipe = Recipe::new(
        "Rum Neat".into(),
        RecipeCategory::Cocktail,
        Some(1),
        vec![RecipeIngredientLine {
            ingredient_name: "Rum".into(),
            product_id: None,
            quantity: Decimal::TWO,
            unit: "oz".into(),
        }],
    );
    store.insert_recipe(&recipe).await.unwrap();
    let app = TestApp::with_store(store).await;

    let listed = app.get("/api/ingredients").await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body[0]["name"], "Rum");
    assert!(listed.body[0]["unitCost"].is_null());

    let costing = app.get(&format!("/api/recipes/{}/costing", recipe.id)).await;
    assert_eq!(costing.status, StatusCode::BAD_REQUEST);
    assert_eq!(costing.body["message"], "Cost of Rum is too large to compute");
}

async fn create_daiquiri(app: &TestApp) -> String {
    for (name, price) in [("Rum", 0.32), ("Lime Juice", 0.20)] {
        let response = app
            .post_json(
                "/api/ingredients",
                &json!({
                    "name": name,
                    "brand": "House",
                    "packageSize": 1,
                    "packageUnit": "oz",
                    "packagePrice": price
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let recipe = app
        .post_json(
            "/api/recipes",
            &json!({
                "name": "Daiquiri",
                "type": "cocktail",
                "servings": 1,
                "ingredients": [
                    { "name": "Rum", "quantity": 2, "unit": "oz" },
                    { "name": "Lime Juice", "quantity": 1, "unit": "oz" }
                ]
            }),
        )
        .await;
    assert_eq!(recipe.status, StatusCode::CREATED);
    assert_eq!(recipe.body["category"], "cocktail");
    recipe.body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn cocktail_costing_matches_worked_example() {
    let app = TestApp::empty().await;
    let id = create_daiquiri(&app).await;

    let response = app.get(&format!("/api/recipes/{}/costing", id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_close(&response.body["ingredientsCost"], 0.84);
    assert_close(&response.body["taxes"], 0.63);
    assert_close(&response.body["sellingPrice"], 3.15);
    assert_eq!(response.body["unresolvedIngredients"], json!([]));
}

#[tokio::test]
async fn cocktail_costing_ignores_indirect_query() {
    let app = TestApp::empty().await;
    let id = create_daiquiri(&app).await;

    let response = app
        .get(&format!(
            "/api/recipes/{}/costing?indirectPercentage=40&profitMargin=80",
            id
        ))
        .await;

    assert_close(&response.body["indirectCosts"], 0.0);
    assert_close(&response.body["sellingPrice"], 3.15);
}

#[tokio::test]
async fn strict_costing_rejects_missing_ingredient() {
    let app = TestApp::empty().await;
    let recipe = app
        .post_json(
            "/api/recipes",
            &json!({
                "name": "Mystery",
                "category": "cocktail",
                "ingredients": [{ "ingredientName": "Unobtainium", "quantity": 1, "unit": "oz" }]
            }),
        )
        .await;
    let id = recipe.body["id"].as_str().unwrap();

    let lenient = app.get(&format!("/api/recipes/{}/costing", id)).await;
    assert_eq!(lenient.status, StatusCode::OK);
    assert_eq!(lenient.body["unresolvedIngredients"], json!(["Unobtainium"]));

    let strict = app.get(&format!("/api/recipes/{}/costing?strict=true", id)).await;
    assert_eq!(strict.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recipe_scaling_multiplies_quantities() {
    let app = TestApp::empty().await;
    let recipe = app
        .post_json(
            "/api/recipes",
            &json!({
                "name": "Rice",
                "category": "main-course",
                "servings": 4,
                "ingredients": [{ "name": "Rice", "quantity": 500, "unit": "g" }]
            }),
        )
        .await;
    let id = recipe.body["id"].as_str().unwrap();

    let scaled = app.get(&format!("/api/recipes/{}/scale?servings=10", id)).await;

    assert_eq!(scaled.status, StatusCode::OK);
    assert_close(&scaled.body["factor"], 2.5);
    assert_close(&scaled.body["ingredients"][0]["quantity"], 1250.0);

    let zero = app.get(&format!("/api/recipes/{}/scale?servings=0", id)).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recipe_requires_positive_servings() {
    let app = TestApp::empty().await;

    let response = app
        .post_json(
            "/api/recipes",
            &json!({ "name": "Soup", "category": "appetizer", "servings": 0 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Servings must be at least 1");
}

#[tokio::test]
async fn recipes_search_by_name() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/recipes?search=cuba").await;

    let names: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Cuba Libre", "Cuban Mojito"]);
}

#[tokio::test]
async fn conversions_between_units() {
    let app = TestApp::empty().await;

    let response = app.get("/api/conversions?value=2&from=lb&to=kg").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_close(&response.body["result"], 0.907);

    let bad = app.get("/api/conversions?value=1&from=cup&to=g").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_query_strings_are_json_400() {
    let app = TestApp::empty().await;

    for uri in [
        "/api/recipes/any/scale?servings=-2",
        "/api/conversions?value=abc&from=g&to=kg",
        "/api/recipes/any/costing?profitMargin=lots",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", uri);
        let message = response.body["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("Invalid query string"), "{}: {}", uri, message);
    }
}

#[tokio::test]
async fn costing_percentages_are_bounded() {
    let app = TestApp::empty().await;
    let id = create_daiquiri(&app).await;

    let response = app
        .get(&format!("/api/recipes/{}/costing?profitMargin=5000", id))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Profit margin cannot exceed 1000");
}
