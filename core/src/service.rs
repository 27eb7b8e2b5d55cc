use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::Database;
use crate::models::{Recipe, RecipeUpdate, clean_text, validate_recipe_name};
use crate::planner::{DragSource, DropOutcome, DropTarget, MealPlan, SlotKey};
use crate::shopping::ShoppingList;
use crate::store::{self, Backend, RecipeStore};

/// Saved recipes plus the meal plan for the current session.
///
/// The plan is never persisted; it lives as long as the service does.
pub struct CookbookService {
    store: Box<dyn RecipeStore>,
    plan: MealPlan,
}

impl CookbookService {
    /// Open storage at `primary` (SQLite), falling back to `fallback` (key-value).
    pub fn open(primary: &Path, fallback: &Path) -> Result<Self> {
        let store = store::open_with_fallback(primary, fallback)?;
        Ok(Self::with_store(store))
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_store(Box::new(db)))
    }

    #[must_use]
    pub fn with_store(store: Box<dyn RecipeStore>) -> Self {
        Self {
            store,
            plan: MealPlan::new(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.store.backend()
    }

    // --- Saved recipes ---

    /// Save (or overwrite) a recipe. Returns the stored copy in its
    /// normalized form, with a fresh id if the recipe had none.
    pub fn save_recipe(&self, recipe: &Recipe) -> Result<Recipe> {
        let mut recipe = recipe.normalized()?;
        if recipe.id.is_empty() {
            recipe.id = uuid::Uuid::new_v4().to_string();
        }

        self.store
            .save_recipe(&recipe)
            .with_context(|| format!("Failed to save recipe '{}'", recipe.name))?;
        info!(id = %recipe.id, name = %recipe.name, backend = %self.backend(), "saved recipe");
        Ok(recipe)
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.store.list_recipes()
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        self.store.get_recipe(id)
    }

    /// Edit name and instructions. Returns the updated recipe, or `None`
    /// when no recipe has that id.
    pub fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<Option<Recipe>> {
        let update = RecipeUpdate {
            name: validate_recipe_name(&update.name)?,
            instructions: clean_text(update.instructions.as_deref()),
        };
        if !self.store.update_recipe(id, &update)? {
            return Ok(None);
        }
        info!(id, name = %update.name, "updated recipe");
        self.store.get_recipe(id)
    }

    pub fn delete_recipe(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_recipe(id)?;
        if deleted {
            info!(id, "deleted recipe");
        }
        Ok(deleted)
    }

    // --- Meal plan ---

    #[must_use]
    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }

    /// Copy a saved recipe into a plan slot.
    pub fn assign_slot(&mut self, slot: SlotKey, recipe_id: &str) -> Result<Recipe> {
        let recipe = self
            .store
            .get_recipe(recipe_id)?
            .with_context(|| format!("Recipe '{recipe_id}' is not in your cookbook"))?;
        self.plan.assign(slot, &recipe);
        Ok(recipe)
    }

    pub fn handle_drop(
        &mut self,
        source: &DragSource,
        destination: Option<&DropTarget>,
    ) -> Result<DropOutcome> {
        let saved: Vec<Recipe> = match source {
            DragSource::SavedList { recipe_id } => {
                self.store.get_recipe(recipe_id)?.into_iter().collect()
            }
            DragSource::Slot(_) => Vec::new(),
        };
        self.plan.handle_drop(source, destination, &saved)
    }

    pub fn clear_slot(&mut self, slot: SlotKey) -> Option<Recipe> {
        self.plan.clear_slot(slot)
    }

    pub fn clear_plan(&mut self) {
        self.plan.clear();
    }

    /// `None` when nothing in the plan needs buying.
    #[must_use]
    pub fn shopping_list(&self) -> Option<ShoppingList> {
        ShoppingList::from_plan(&self.plan)
    }
}
