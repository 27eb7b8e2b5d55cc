use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Recipes carry at most this many ingredient/measure pairs.
pub const MAX_INGREDIENTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub instructions: Option<String>,
    pub source_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// The editable part of a saved recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeUpdate {
    pub name: String,
    pub instructions: Option<String>,
}

pub fn validate_recipe_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Recipe name must not be empty");
    }
    Ok(name.to_string())
}

/// Trimmed text, or `None` when nothing is left.
#[must_use]
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Key used to decide whether two ingredient names mean the same thing:
/// inner whitespace collapsed, lowercase.
#[must_use]
pub fn normalize_ingredient_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Recipe {
    /// The canonical stored form: name validated, text fields trimmed with
    /// blanks dropped, blank ingredients removed, at most
    /// [`MAX_INGREDIENTS`] ingredients.
    pub fn normalized(&self) -> Result<Recipe> {
        let mut ingredients: Vec<Ingredient> = self
            .ingredients
            .iter()
            .filter_map(|i| {
                clean_text(Some(&i.name)).map(|name| Ingredient {
                    name,
                    measure: clean_text(i.measure.as_deref()),
                })
            })
            .collect();
        ingredients.truncate(MAX_INGREDIENTS);

        Ok(Recipe {
            id: self.id.trim().to_string(),
            name: validate_recipe_name(&self.name)?,
            thumbnail_url: clean_text(self.thumbnail_url.as_deref()),
            category: clean_text(self.category.as_deref()),
            instructions: clean_text(self.instructions.as_deref()),
            source_url: clean_text(self.source_url.as_deref()),
            ingredients,
        })
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    clean_text(fields.get(key).and_then(Value::as_str))
}

fn first_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| field_text(fields, key))
}

fn ingredient_at(
    fields: &Map<String, Value>,
    name_key: &str,
    measure_key: &str,
) -> Option<Ingredient> {
    field_text(fields, name_key).map(|name| Ingredient {
        name,
        measure: field_text(fields, measure_key),
    })
}

/// Collect ingredient pairs from a flat record.
///
/// Both the legacy `ingrN`/`measureN` keys and TheMealDB's
/// `strIngredientN`/`strMeasureN` keys are read for every index. When both
/// shapes name the same ingredient at an index it is kept once; when they
/// disagree both are kept, legacy first.
#[must_use]
pub fn ingredients_from_fields(fields: &Map<String, Value>) -> Vec<Ingredient> {
    let mut ingredients = Vec::new();

    for i in 1..=MAX_INGREDIENTS {
        let legacy = ingredient_at(fields, &format!("ingr{i}"), &format!("measure{i}"));
        let native = ingredient_at(
            fields,
            &format!("strIngredient{i}"),
            &format!("strMeasure{i}"),
        );

        match (legacy, native) {
            (Some(mut legacy), Some(native)) => {
                if normalize_ingredient_name(&legacy.name)
                    == normalize_ingredient_name(&native.name)
                {
                    if legacy.measure.is_none() {
                        legacy.measure = native.measure;
                    }
                    ingredients.push(legacy);
                } else {
                    ingredients.push(legacy);
                    ingredients.push(native);
                }
            }
            (Some(one), None) | (None, Some(one)) => ingredients.push(one),
            (None, None) => {}
        }
    }

    if ingredients.len() > MAX_INGREDIENTS {
        warn!(
            count = ingredients.len(),
            "record has more than {MAX_INGREDIENTS} ingredients; extra entries dropped"
        );
        ingredients.truncate(MAX_INGREDIENTS);
    }

    ingredients
}

/// Flatten a recipe into the legacy record layout (`ingr1..`, `measure1..`).
#[must_use]
pub fn legacy_fields(recipe: &Recipe) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("id".into(), Value::String(recipe.id.clone()));
    fields.insert("name".into(), Value::String(recipe.name.clone()));

    let optional = [
        ("thumbnail_url", &recipe.thumbnail_url),
        ("category", &recipe.category),
        ("instructions", &recipe.instructions),
        ("source_url", &recipe.source_url),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            fields.insert(key.into(), Value::String(v.clone()));
        }
    }

    for (i, ingredient) in recipe.ingredients.iter().take(MAX_INGREDIENTS).enumerate() {
        let n = i + 1;
        fields.insert(format!("ingr{n}"), Value::String(ingredient.name.clone()));
        if let Some(measure) = &ingredient.measure {
            fields.insert(format!("measure{n}"), Value::String(measure.clone()));
        }
    }

    fields
}

/// Build a recipe from a flat record in either the legacy layout or
/// TheMealDB's layout. A missing id is left empty for the caller to fill.
pub fn recipe_from_fields(fields: &Map<String, Value>) -> Result<Recipe> {
    let name = first_field(fields, &["name", "strMeal"]).context("Recipe record has no name")?;

    Ok(Recipe {
        id: first_field(fields, &["id", "idMeal"]).unwrap_or_default(),
        name,
        thumbnail_url: first_field(fields, &["thumbnail_url", "strMealThumb"]),
        category: first_field(fields, &["category", "strCategory"]),
        instructions: first_field(fields, &["instructions", "strInstructions"]),
        source_url: first_field(fields, &["source_url", "strSource"]),
        ingredients: ingredients_from_fields(fields),
    })
}
