use std::fmt;
use std::path::Path;

use anyhow::{Result, anyhow};
use serde::Serialize;
use tracing::{info, warn};

use crate::db::Database;
use crate::kv::KeyValueStore;
use crate::models::{Recipe, RecipeUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Sqlite,
    KeyValue,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::KeyValue => write!(f, "key-value"),
        }
    }
}

/// Saved-recipe persistence, implemented by both storage backends.
///
/// `update_recipe` and `delete_recipe` report whether a recipe with that id
/// existed; a missing id is not an error.
pub trait RecipeStore: Send {
    fn backend(&self) -> Backend;
    fn save_recipe(&self, recipe: &Recipe) -> Result<()>;
    fn get_recipe(&self, id: &str) -> Result<Option<Recipe>>;
    fn list_recipes(&self) -> Result<Vec<Recipe>>;
    fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<bool>;
    fn delete_recipe(&self, id: &str) -> Result<bool>;
}

impl RecipeStore for Database {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn save_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.upsert_recipe(recipe)
    }

    fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        Database::get_recipe(self, id)
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>> {
        Database::list_recipes(self)
    }

    fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<bool> {
        Database::update_recipe(self, id, update)
    }

    fn delete_recipe(&self, id: &str) -> Result<bool> {
        Database::delete_recipe(self, id)
    }
}

impl RecipeStore for KeyValueStore {
    fn backend(&self) -> Backend {
        Backend::KeyValue
    }

    fn save_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.upsert_recipe(recipe)
    }

    fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        KeyValueStore::get_recipe(self, id)
    }

    fn list_recipes(&self) -> Result<Vec<Recipe>> {
        KeyValueStore::list_recipes(self)
    }

    fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<bool> {
        KeyValueStore::update_recipe(self, id, update)
    }

    fn delete_recipe(&self, id: &str) -> Result<bool> {
        KeyValueStore::delete_recipe(self, id)
    }
}

/// Open the SQLite database at `primary`, falling back to the key-value file
/// at `fallback` when it cannot be opened.
pub fn open_with_fallback(primary: &Path, fallback: &Path) -> Result<Box<dyn RecipeStore>> {
    let primary_err = match Database::open(primary) {
        Ok(db) => {
            info!(path = %primary.display(), "opened sqlite recipe store");
            return Ok(Box::new(db));
        }
        Err(e) => e,
    };

    let detail = format!("{primary_err:#}");
    warn!(
        path = %primary.display(),
        error = %detail,
        "sqlite unavailable, falling back to key-value storage"
    );

    match KeyValueStore::open(fallback) {
        Ok(kv) => {
            info!(path = %fallback.display(), "opened key-value recipe store");
            Ok(Box::new(kv))
        }
        Err(fallback_err) => Err(anyhow!(
            "No storage backend available: sqlite: {primary_err:#}; key-value: {fallback_err:#}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe(id: &str, name: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail_url: None,
            category: Some("Dessert".to_string()),
            instructions: Some("Mix and bake.".to_string()),
            source_url: Some("https://example.com".to_string()),
            ingredients: Vec::new(),
        }
    }

    fn backends() -> Vec<Box<dyn RecipeStore>> {
        vec![
            Box::new(Database::open_in_memory().unwrap()),
            Box::new(KeyValueStore::in_memory()),
        ]
    }

    #[test]
    fn test_save_then_read_returns_same_fields() {
        for store in backends() {
            let recipe = sample_recipe("1", "Brownies");
            store.save_recipe(&recipe).unwrap();
            let fetched = store.get_recipe("1").unwrap().unwrap();
            assert_eq!(fetched, recipe, "backend {}", store.backend());
        }
    }

    #[test]
    fn test_normalized_recipe_reads_back_identical() {
        for store in backends() {
            let mut recipe = sample_recipe(" 4 ", " Trifle ");
            recipe.thumbnail_url = Some("  ".to_string());
            recipe.category = Some(" Dessert\n".to_string());
            recipe.source_url = Some(String::new());
            let recipe = recipe.normalized().unwrap();

            store.save_recipe(&recipe).unwrap();
            let fetched = store.get_recipe("4").unwrap().unwrap();
            assert_eq!(fetched, recipe, "backend {}", store.backend());
        }
    }

    #[test]
    fn test_save_twice_updates() {
        for store in backends() {
            store.save_recipe(&sample_recipe("1", "Brownies")).unwrap();
            store.save_recipe(&sample_recipe("1", "Fudge Brownies")).unwrap();
            let all = store.list_recipes().unwrap();
            assert_eq!(all.len(), 1, "backend {}", store.backend());
            assert_eq!(all[0].name, "Fudge Brownies");
        }
    }

    #[test]
    fn test_delete_missing_is_not_an_error() {
        for store in backends() {
            assert!(!store.delete_recipe("ghost").unwrap());
        }
    }

    #[test]
    fn test_list_order_matches_across_backends() {
        let mut orders = Vec::new();
        for store in backends() {
            store.save_recipe(&sample_recipe("2", "crumble")).unwrap();
            store.save_recipe(&sample_recipe("1", "Brownies")).unwrap();
            store.save_recipe(&sample_recipe("3", "Apple pie")).unwrap();
            let names: Vec<String> = store
                .list_recipes()
                .unwrap()
                .into_iter()
                .map(|r| r.name)
                .collect();
            orders.push(names);
        }
        assert_eq!(orders[0], vec!["Apple pie", "Brownies", "crumble"]);
        assert_eq!(orders[0], orders[1]);
    }

    #[test]
    fn test_open_prefers_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_with_fallback(
            &dir.path().join("cookbook.db"),
            &dir.path().join("cookbook-kv.json"),
        )
        .unwrap();
        assert_eq!(store.backend(), Backend::Sqlite);
        assert!(!dir.path().join("cookbook-kv.json").exists());
    }

    #[test]
    fn test_open_falls_back_to_key_value() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("missing").join("cookbook.db");
        let fallback = dir.path().join("cookbook-kv.json");

        let store = open_with_fallback(&primary, &fallback).unwrap();
        assert_eq!(store.backend(), Backend::KeyValue);

        store.save_recipe(&sample_recipe("1", "Brownies")).unwrap();
        assert!(fallback.exists());
    }

    #[test]
    fn test_open_fails_when_both_backends_fail() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("missing").join("cookbook.db");
        let fallback = dir.path().join("also-missing").join("cookbook-kv.json");

        let err = open_with_fallback(&primary, &fallback).err().unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("sqlite"));
        assert!(message.contains("key-value"));
    }
}
