//! Shopping list derived from the meal plan.
//!
//! Ingredients are grouped by a normalized name so that "Olive  Oil" from one
//! recipe and "olive oil" from another land on the same line.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Recipe, normalize_ingredient_name, recipe_from_fields};
use crate::planner::MealPlan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub measures: Vec<String>,
    pub recipes: Vec<String>,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub planned_meals: usize,
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// `None` means nothing to list: the plan is empty or none of its
    /// recipes carry an ingredient.
    #[must_use]
    pub fn from_plan(plan: &MealPlan) -> Option<Self> {
        Self::from_recipes(plan.recipes())
    }

    /// Build a list from raw flat records in either ingredient layout.
    /// Records without a name are skipped.
    #[must_use]
    pub fn from_records(records: &[Map<String, Value>]) -> Option<Self> {
        let recipes: Vec<Recipe> = records
            .iter()
            .filter_map(|fields| recipe_from_fields(fields).ok())
            .collect();
        Self::from_recipes(&recipes)
    }

    pub fn from_recipes<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) -> Option<Self> {
        let mut grouped: BTreeMap<String, ShoppingItem> = BTreeMap::new();
        let mut planned_meals = 0;

        for recipe in recipes {
            planned_meals += 1;
            for ingredient in &recipe.ingredients {
                let key = normalize_ingredient_name(&ingredient.name);
                if key.is_empty() {
                    continue;
                }
                let item = grouped.entry(key).or_insert_with(|| ShoppingItem {
                    name: ingredient.name.trim().to_string(),
                    measures: Vec::new(),
                    recipes: Vec::new(),
                    occurrences: 0,
                });
                item.occurrences += 1;
                if let Some(measure) = ingredient.measure.as_deref().map(str::trim) {
                    if !measure.is_empty() {
                        item.measures.push(measure.to_string());
                    }
                }
                if !item.recipes.contains(&recipe.name) {
                    item.recipes.push(recipe.name.clone());
                }
            }
        }

        if grouped.is_empty() {
            return None;
        }

        Some(Self {
            planned_meals,
            items: grouped.into_values().collect(),
        })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["ingredient", "measures", "recipes", "occurrences"])?;
        for item in &self.items {
            let measures = item.measures.join("; ");
            let recipes = item.recipes.join("; ");
            let occurrences = item.occurrences.to_string();
            wtr.write_record([
                item.name.as_str(),
                measures.as_str(),
                recipes.as_str(),
                occurrences.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
