mod book;
mod helpers;
mod plan;
mod search;

use anyhow::Result;

use crate::themealdb::MealDbClient;
use cookbook_core::models::Recipe;

use helpers::{exit_not_found, print_recipe_table, prompt_choice};

pub(crate) use book::{cmd_delete, cmd_edit, cmd_list, cmd_show};
pub(crate) use plan::cmd_plan;
pub(crate) use search::{cmd_random, cmd_save, cmd_search};

/// Search the catalog and let the user pick one result. A single match is
/// taken without prompting.
pub(super) async fn pick_recipe(client: &MealDbClient, term: &str, json: bool) -> Result<Recipe> {
    let mut results = client.search(term).await;

    if results.is_empty() {
        exit_not_found(&format!("No recipes found for '{term}'"), json);
    }

    if results.len() == 1 {
        return Ok(results.remove(0));
    }

    let refs: Vec<&Recipe> = results.iter().collect();
    print_recipe_table(&refs);
    let idx = prompt_choice(results.len())?;
    Ok(results.swap_remove(idx))
}
