use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{Recipe, ingredients_from_fields};

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// TheMealDB answers `null` rather than `[]` when nothing matches.
    pub meals: Option<Vec<MealData>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealData {
    pub id_meal: Option<String>,
    pub str_meal: Option<String>,
    pub str_meal_thumb: Option<String>,
    pub str_category: Option<String>,
    pub str_instructions: Option<String>,
    pub str_source: Option<String>,
    // strIngredientN / strMeasureN and everything else
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn meal_to_recipe(m: MealData) -> Option<Recipe> {
    let name = non_empty(m.str_meal)?;
    let id = non_empty(m.id_meal).unwrap_or_else(|| Uuid::new_v4().to_string());

    Some(Recipe {
        id,
        name,
        thumbnail_url: non_empty(m.str_meal_thumb),
        category: non_empty(m.str_category),
        instructions: non_empty(m.str_instructions),
        source_url: non_empty(m.str_source),
        ingredients: ingredients_from_fields(&m.fields),
    })
}
