//! Bundled sample meals served when TheMealDB cannot be reached.

use serde_json::{Value, json};

use crate::models::Recipe;
use crate::themealdb::{MealData, meal_to_recipe};

fn sample_meals() -> Vec<Value> {
    vec![
        json!({
            "idMeal": "52771",
            "strMeal": "Spicy Arrabiata Penne",
            "strCategory": "Vegetarian",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/ustsqw1468250014.jpg",
            "strInstructions": "Bring a large pot of water to a boil. Add kosher salt to the boiling water, then add the pasta. Cook according to the package instructions. In a large skillet, heat the olive oil over medium-high heat. Add the garlic, tomatoes and red chile flakes and simmer for 10 minutes. Toss the drained pasta in the sauce and garnish with basil.",
            "strSource": null,
            "strIngredient1": "penne rigate",
            "strMeasure1": "1 pound",
            "strIngredient2": "olive oil",
            "strMeasure2": "1/4 cup",
            "strIngredient3": "garlic",
            "strMeasure3": "3 cloves",
            "strIngredient4": "chopped tomatoes",
            "strMeasure4": "1 tin",
            "strIngredient5": "red chile flakes",
            "strMeasure5": "1/2 teaspoon",
            "strIngredient6": "basil",
            "strMeasure6": "6 leaves"
        }),
        json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strCategory": "Chicken",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strInstructions": "Preheat oven to 350F. Spray a 9x13-inch baking pan with non-stick spray. Combine soy sauce, water, brown sugar, ginger and garlic in a small saucepan and bring to a boil. Place chicken in the pan, pour the sauce over it and bake for 35 minutes. Serve over rice with steamed vegetables.",
            "strSource": "https://www.themealdb.com/meal/52772",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "water",
            "strMeasure2": "1/2 cup",
            "strIngredient3": "brown sugar",
            "strMeasure3": "1/4 cup",
            "strIngredient4": "ground ginger",
            "strMeasure4": "1/2 teaspoon",
            "strIngredient5": "garlic",
            "strMeasure5": "1/2 teaspoon",
            "strIngredient6": "chicken breasts",
            "strMeasure6": "2",
            "strIngredient7": "rice",
            "strMeasure7": "3 cups"
        }),
        json!({
            "idMeal": "52959",
            "strMeal": "Baked salmon with fennel & tomatoes",
            "strCategory": "Seafood",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/1548772327.jpg",
            "strInstructions": "Heat oven to 180C. Boil the fennel for 5 minutes, drain, then tip into an ovenproof dish with the tomatoes and olive oil. Bake for 20 minutes, lay the salmon over the vegetables and bake for 10 minutes more.",
            "strSource": "https://www.bbcgoodfood.com/recipes/7745/baked-salmon-with-fennel-and-tomatoes",
            "strIngredient1": "fennel",
            "strMeasure1": "2 medium",
            "strIngredient2": "parsley",
            "strMeasure2": "2 tbs chopped",
            "strIngredient3": "lemon",
            "strMeasure3": "juice of 1",
            "strIngredient4": "cherry tomatoes",
            "strMeasure4": "175g",
            "strIngredient5": "olive oil",
            "strMeasure5": "1 tbs",
            "strIngredient6": "salmon",
            "strMeasure6": "350g"
        }),
    ]
}

/// Every bundled meal, already converted to recipes.
#[must_use]
pub fn mock_meals() -> Vec<Recipe> {
    sample_meals()
        .into_iter()
        .filter_map(|v| serde_json::from_value::<MealData>(v).ok())
        .filter_map(meal_to_recipe)
        .collect()
}

/// Case-insensitive match on name or category. A blank term matches nothing.
#[must_use]
pub fn search_mock(term: &str) -> Vec<Recipe> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    mock_meals()
        .into_iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&term)
                || r
                    .category
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&term))
        })
        .collect()
}
