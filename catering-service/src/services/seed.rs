//! Demo catalog loaded when `STORE_SEED` is enabled.

use rust_decimal::Decimal;

use crate::models::{Client, Ingredient, Recipe, RecipeCategory, RecipeIngredientLine};

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<Recipe>,
    pub clients: Vec<Client>,
}

fn ingredient(
    name: &str,
    category: &str,
    brand: &str,
    size_ml: i64,
    price_cents: i64,
) -> Ingredient {
    let mut ingredient = Ingredient::new(
        name.to_string(),
        brand.to_string(),
        Decimal::new(size_ml, 0),
        "ml".to_string(),
        Decimal::new(price_cents, 2),
    );
    ingredient.category = Some(category.to_string());
    ingredient.units = vec!["oz".to_string(), "ml".to_string()];
    ingredient
}

/// Quantity in hundredths, so `line("Rum", 150, "oz")` is 1.5 oz.
fn line(name: &str, hundredths: i64, unit: &str) -> RecipeIngredientLine {
    RecipeIngredientLine {
        ingredient_name: name.to_string(),
        product_id: None,
        quantity: Decimal::new(hundredths, 2),
        unit: unit.to_string(),
    }
}

fn cocktail(name: &str, method: &str, description: &str, lines: Vec<RecipeIngredientLine>) -> Recipe {
    let mut recipe = Recipe::new(name.to_string(), RecipeCategory::Cocktail, Some(1), lines);
    recipe.method = Some(method.to_string());
    recipe.description = Some(description.to_string());
    recipe
}

pub fn demo_catalog() -> SeedData {
    let ingredients = vec![
        ingredient("Rum", "spirit", "Bacardi Superior", 750, 1899),
        ingredient("Vodka", "spirit", "Absolut Vodka", 1000, 2499),
        ingredient("Tequila", "spirit", "Jose Cuervo Silver", 750, 1999),
        ingredient("Gin", "spirit", "Beefeater", 750, 2199),
        ingredient("Peach liqueur", "spirit", "DeKuyper Peachtree", 750, 1299),
        ingredient("Coca Cola", "mixer", "Coca-Cola Classic", 2000, 249),
        ingredient("Soda water", "mixer", "Club Soda", 1000, 199),
        ingredient("Lime juice", "juice", "Fresh Squeezed", 1000, 599),
        ingredient("Orange juice", "juice", "Tropicana", 1750, 449),
        ingredient("Cranberry juice", "juice", "Ocean Spray", 1890, 399),
        ingredient("Simple syrup", "syrup", "Monin Pure Cane", 1000, 899),
        ingredient("Grenadine", "syrup", "Rose's", 355, 349),
    ];

    let recipes = vec![
        cocktail(
            "Cuba Libre",
            "built",
            "Classic refreshing Cuban cocktail",
            vec![
                line("Ice", 0, "unit"),
                line("Rum", 150, "oz"),
                line("Coca Cola", 400, "oz"),
                line("Lime juice", 25, "oz"),
            ],
        ),
        cocktail(
            "Daiquiri (Classic)",
            "shaker",
            "Classic Cuban rum cocktail",
            vec![
                line("Ice", 0, "unit"),
                line("Rum", 200, "oz"),
                line("Lime juice", 100, "oz"),
                line("Simple syrup", 75, "oz"),
            ],
        ),
        cocktail(
            "Cuban Mojito",
            "built",
            "Refreshing cocktail with mint",
            vec![
                line("Simple syrup", 75, "oz"),
                line("Mint leaves", 0, "muddle"),
                line("Ice", 0, "unit"),
                line("Rum", 200, "oz"),
                line("Lime juice", 75, "oz"),
                line("Soda water", 200, "oz"),
            ],
        ),
        cocktail(
            "Sex on The Beach",
            "built",
            "Fruity and vibrant cocktail",
            vec![
                line("Ice", 600, "unit"),
                line("Vodka", 150, "oz"),
                line("Peach liqueur", 100, "oz"),
                line("Orange juice", 200, "oz"),
                line("Cranberry juice", 200, "oz"),
                line("Grenadine", 25, "oz"),
            ],
        ),
    ];

    let clients = vec![Client::new(
        "Demo Events Co.".to_string(),
        Some("events@example.com".to_string()),
        None,
        None,
    )];

    SeedData {
        ingredients,
        recipes,
        clients,
    }
}
