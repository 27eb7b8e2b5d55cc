use anyhow::{Result, bail};

use cookbook_core::models::{Recipe, RecipeUpdate};
use cookbook_core::service::CookbookService;

use super::helpers::{confirm, exit_not_found, print_recipe_detail, print_recipe_table};

pub(crate) fn cmd_list(svc: &CookbookService, json: bool) -> Result<()> {
    let recipes = svc.list_recipes()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("Your cookbook is empty. Save one with: cookbook save <term>");
        return Ok(());
    }

    let refs: Vec<&Recipe> = recipes.iter().collect();
    print_recipe_table(&refs);
    println!("{} saved recipes ({} storage)", recipes.len(), svc.backend());
    Ok(())
}

pub(crate) fn cmd_show(svc: &CookbookService, id: &str, json: bool) -> Result<()> {
    let Some(recipe) = svc.get_recipe(id)? else {
        exit_not_found(&format!("Recipe {id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        print_recipe_detail(&recipe);
    }
    Ok(())
}

pub(crate) fn cmd_edit(
    svc: &CookbookService,
    id: &str,
    name: Option<String>,
    instructions: Option<String>,
    json: bool,
) -> Result<()> {
    if name.is_none() && instructions.is_none() {
        bail!("Nothing to update. Use --name and/or --instructions");
    }

    let Some(existing) = svc.get_recipe(id)? else {
        exit_not_found(&format!("Recipe {id} not found"), json);
    };

    let update = RecipeUpdate {
        name: name.unwrap_or(existing.name),
        instructions: instructions.or(existing.instructions),
    };
    let Some(updated) = svc.update_recipe(id, &update)? else {
        exit_not_found(&format!("Recipe {id} not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated recipe {id}: {}", updated.name);
    }
    Ok(())
}

pub(crate) fn cmd_delete(svc: &CookbookService, id: &str, yes: bool, json: bool) -> Result<()> {
    let Some(recipe) = svc.get_recipe(id)? else {
        exit_not_found(&format!("Recipe {id} not found"), json);
    };

    if !yes && !confirm(&format!("Delete '{}' from your cookbook?", recipe.name))? {
        if json {
            println!("{}", serde_json::json!({ "deleted": false }));
        } else {
            println!("Kept {}", recipe.name);
        }
        return Ok(());
    }

    svc.delete_recipe(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted {} (id: {id})", recipe.name);
    }
    Ok(())
}
