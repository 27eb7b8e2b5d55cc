use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{Ingredient, MAX_INGREDIENTS, Recipe, RecipeUpdate};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()
            .with_context(|| format!("Failed to prepare database: {}", path.display()))?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    thumbnail_url TEXT,
                    category TEXT,
                    instructions TEXT,
                    source_url TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    measure TEXT,
                    PRIMARY KEY (recipe_id, position)
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_name ON recipes(name);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    // Expects columns:
    // 0: id, 1: name, 2: thumbnail_url, 3: category, 4: instructions, 5: source_url
    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            thumbnail_url: row.get(2)?,
            category: row.get(3)?,
            instructions: row.get(4)?,
            source_url: row.get(5)?,
            ingredients: Vec::new(),
        })
    }

    fn load_ingredients(&self, recipe_id: &str) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, measure FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY position",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                Ok(Ingredient {
                    name: row.get(0)?,
                    measure: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    // --- Recipes ---

    /// Insert a recipe, or replace every field of the one with the same id.
    pub fn upsert_recipe(&self, recipe: &Recipe) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO recipes (id, name, thumbnail_url, category, instructions, source_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                thumbnail_url = excluded.thumbnail_url,
                category = excluded.category,
                instructions = excluded.instructions,
                source_url = excluded.source_url,
                updated_at = excluded.updated_at",
            params![
                recipe.id,
                recipe.name,
                recipe.thumbnail_url,
                recipe.category,
                recipe.instructions,
                recipe.source_url,
                now,
                now,
            ],
        )?;

        tx.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![recipe.id],
        )?;
        for (position, ingredient) in recipe.ingredients.iter().take(MAX_INGREDIENTS).enumerate() {
            tx.execute(
                "INSERT INTO recipe_ingredients (recipe_id, position, name, measure)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    recipe.id,
                    position as i64,
                    ingredient.name,
                    ingredient.measure
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let recipe = self
            .conn
            .query_row(
                "SELECT id, name, thumbnail_url, category, instructions, source_url
                 FROM recipes WHERE id = ?1",
                params![id],
                Self::recipe_from_row,
            )
            .optional()?;

        match recipe {
            Some(mut recipe) => {
                recipe.ingredients = self.load_ingredients(&recipe.id)?;
                Ok(Some(recipe))
            }
            None => Ok(None),
        }
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, thumbnail_url, category, instructions, source_url
             FROM recipes ORDER BY name COLLATE NOCASE, id",
        )?;
        let mut recipes = stmt
            .query_map([], Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for recipe in &mut recipes {
            recipe.ingredients = self.load_ingredients(&recipe.id)?;
        }
        Ok(recipes)
    }

    pub fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<bool> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE recipes SET name = ?1, instructions = ?2, updated_at = ?3 WHERE id = ?4",
            params![update.name, update.instructions, now, id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_recipe(&self, id: &str) -> Result<bool> {
        // Ingredients go through ON DELETE CASCADE
        let rows = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: "52772".to_string(),
            name: "Teriyaki Chicken Casserole".to_string(),
            thumbnail_url: Some("https://example.com/teriyaki.jpg".to_string()),
            category: Some("Chicken".to_string()),
            instructions: Some("Preheat oven to 350F.".to_string()),
            source_url: Some("https://example.com/teriyaki".to_string()),
            ingredients: vec![
                Ingredient {
                    name: "soy sauce".to_string(),
                    measure: Some("3/4 cup".to_string()),
                },
                Ingredient {
                    name: "chicken breasts".to_string(),
                    measure: Some("2".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_upsert_and_get_recipe() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_recipe(&sample_recipe()).unwrap();

        let fetched = db.get_recipe("52772").unwrap().unwrap();
        assert_eq!(fetched, sample_recipe());
    }

    #[test]
    fn test_get_recipe_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_recipe("nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_same_id_updates() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_recipe(&sample_recipe()).unwrap();

        let mut changed = sample_recipe();
        changed.name = "Teriyaki Bake".to_string();
        changed.category = None;
        changed.ingredients.truncate(1);
        db.upsert_recipe(&changed).unwrap();

        assert_eq!(db.list_recipes().unwrap().len(), 1);
        let fetched = db.get_recipe("52772").unwrap().unwrap();
        assert_eq!(fetched.name, "Teriyaki Bake");
        assert!(fetched.category.is_none());
        assert_eq!(fetched.ingredients.len(), 1);
    }

    #[test]
    fn test_list_recipes_ordered_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_recipe(&sample_recipe()).unwrap();
        db.upsert_recipe(&Recipe {
            id: "52771".to_string(),
            name: "arrabiata".to_string(),
            thumbnail_url: None,
            category: None,
            instructions: None,
            source_url: None,
            ingredients: Vec::new(),
        })
        .unwrap();

        let all = db.list_recipes().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "arrabiata");
        assert_eq!(all[1].ingredients.len(), 2);
    }

    #[test]
    fn test_update_recipe() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_recipe(&sample_recipe()).unwrap();

        let update = RecipeUpdate {
            name: "Weeknight Teriyaki".to_string(),
            instructions: None,
        };
        assert!(db.update_recipe("52772", &update).unwrap());

        let fetched = db.get_recipe("52772").unwrap().unwrap();
        assert_eq!(fetched.name, "Weeknight Teriyaki");
        assert!(fetched.instructions.is_none());
        // Untouched fields survive the edit
        assert_eq!(fetched.category.as_deref(), Some("Chicken"));
        assert_eq!(fetched.ingredients.len(), 2);
    }

    #[test]
    fn test_update_recipe_not_found() {
        let db = Database::open_in_memory().unwrap();
        let update = RecipeUpdate {
            name: "Ghost".to_string(),
            instructions: None,
        };
        assert!(!db.update_recipe("missing", &update).unwrap());
    }

    #[test]
    fn test_delete_recipe() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_recipe(&sample_recipe()).unwrap();

        assert!(db.delete_recipe("52772").unwrap());
        assert!(db.get_recipe("52772").unwrap().is_none());
        assert!(db.load_ingredients("52772").unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_recipe_does_not_fail() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.delete_recipe("never-saved").unwrap());
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookbook.db");
        {
            let db = Database::open(&path).unwrap();
            db.upsert_recipe(&sample_recipe()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_open_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cookbook.db");
        assert!(Database::open(&path).is_err());
    }
}
