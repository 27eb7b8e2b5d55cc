//! File-backed string key-value storage, used when SQLite is unavailable.
//!
//! Entries live in a single JSON object. Every mutation rewrites the file
//! through a temporary sibling and a rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{Recipe, RecipeUpdate, legacy_fields, recipe_from_fields};

const RECIPE_PREFIX: &str = "cookbook.recipe.";

pub struct KeyValueStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read key-value store: {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).with_context(|| {
                    format!("Key-value store is not valid JSON: {}", path.display())
                })?
            }
        } else {
            BTreeMap::new()
        };

        let store = Self {
            path: Some(path.to_path_buf()),
            entries: Mutex::new(entries),
        };
        // Write once up front so an unwritable location fails at startup
        store.flush(&store.lock())?;
        Ok(store)
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = serde_json::to_string(entries)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, data)
            .with_context(|| format!("Failed to write key-value store: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace key-value store: {}", path.display()))?;
        Ok(())
    }

    // --- Raw key-value access ---

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock();
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            // Keep memory consistent with what is on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.flush(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    // --- Recipes ---

    fn recipe_key(id: &str) -> String {
        format!("{RECIPE_PREFIX}{id}")
    }

    fn decode_recipe(key: &str, raw: &str) -> Result<Recipe> {
        let fields: Map<String, Value> = serde_json::from_str(raw)
            .with_context(|| format!("Stored value for '{key}' is not a JSON object"))?;
        recipe_from_fields(&fields)
    }

    pub fn upsert_recipe(&self, recipe: &Recipe) -> Result<()> {
        let value = serde_json::to_string(&legacy_fields(recipe))?;
        self.set_item(&Self::recipe_key(&recipe.id), &value)
    }

    pub fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let key = Self::recipe_key(id);
        self.get_item(&key)
            .map(|raw| Self::decode_recipe(&key, &raw))
            .transpose()
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let entries = self.lock();
        let mut recipes: Vec<Recipe> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(RECIPE_PREFIX))
            .filter_map(|(key, raw)| match Self::decode_recipe(key, raw) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable recipe entry");
                    None
                }
            })
            .collect();
        recipes.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(recipes)
    }

    pub fn update_recipe(&self, id: &str, update: &RecipeUpdate) -> Result<bool> {
        let Some(mut recipe) = self.get_recipe(id)? else {
            return Ok(false);
        };
        recipe.name.clone_from(&update.name);
        recipe.instructions.clone_from(&update.instructions);
        self.upsert_recipe(&recipe)?;
        Ok(true)
    }

    pub fn delete_recipe(&self, id: &str) -> Result<bool> {
        self.remove_item(&Self::recipe_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn sample_recipe() -> Recipe {
        Recipe {
            id: "52771".to_string(),
            name: "Spicy Arrabiata Penne".to_string(),
            thumbnail_url: Some("https://example.com/penne.jpg".to_string()),
            category: Some("Vegetarian".to_string()),
            instructions: Some("Boil the pasta.".to_string()),
            source_url: None,
            ingredients: vec![Ingredient {
                name: "penne rigate".to_string(),
                measure: Some("1 pound".to_string()),
            }],
        }
    }

    #[test]
    fn test_upsert_and_get_recipe() {
        let kv = KeyValueStore::in_memory();
        kv.upsert_recipe(&sample_recipe()).unwrap();
        assert_eq!(kv.get_recipe("52771").unwrap().unwrap(), sample_recipe());
    }

    #[test]
    fn test_values_use_legacy_layout() {
        let kv = KeyValueStore::in_memory();
        kv.upsert_recipe(&sample_recipe()).unwrap();
        let raw = kv.get_item("cookbook.recipe.52771").unwrap();
        let fields: Map<String, Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(fields["ingr1"], "penne rigate");
        assert_eq!(fields["measure1"], "1 pound");
    }

    #[test]
    fn test_upsert_same_id_updates() {
        let kv = KeyValueStore::in_memory();
        kv.upsert_recipe(&sample_recipe()).unwrap();
        let mut changed = sample_recipe();
        changed.name = "Penne all'arrabbiata".to_string();
        kv.upsert_recipe(&changed).unwrap();

        let all = kv.list_recipes().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Penne all'arrabbiata");
    }

    #[test]
    fn test_update_and_delete() {
        let kv = KeyValueStore::in_memory();
        kv.upsert_recipe(&sample_recipe()).unwrap();

        let update = RecipeUpdate {
            name: "Quick Penne".to_string(),
            instructions: Some("Boil, sauce, serve.".to_string()),
        };
        assert!(kv.update_recipe("52771", &update).unwrap());
        let fetched = kv.get_recipe("52771").unwrap().unwrap();
        assert_eq!(fetched.name, "Quick Penne");
        assert_eq!(fetched.category.as_deref(), Some("Vegetarian"));

        assert!(kv.delete_recipe("52771").unwrap());
        assert!(!kv.delete_recipe("52771").unwrap());
        assert!(!kv.update_recipe("52771", &update).unwrap());
    }

    #[test]
    fn test_list_skips_corrupt_entries() {
        let kv = KeyValueStore::in_memory();
        kv.upsert_recipe(&sample_recipe()).unwrap();
        kv.set_item("cookbook.recipe.bad", "not json").unwrap();
        kv.set_item("unrelated", "{}").unwrap();

        let all = kv.list_recipes().unwrap();
        assert_eq!(all.len(), 1);
        assert!(kv.get_recipe("bad").is_err());
    }

    #[test]
    fn test_file_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookbook-kv.json");
        {
            let kv = KeyValueStore::open(&path).unwrap();
            kv.upsert_recipe(&sample_recipe()).unwrap();
        }
        let kv = KeyValueStore::open(&path).unwrap();
        assert_eq!(kv.list_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookbook-kv.json");
        KeyValueStore::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookbook-kv.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(KeyValueStore::open(&path).is_err());
    }

    #[test]
    fn test_open_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cookbook-kv.json");
        assert!(KeyValueStore::open(&path).is_err());
    }
}
