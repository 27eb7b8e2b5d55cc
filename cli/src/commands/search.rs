use anyhow::Result;
use std::process;

use crate::themealdb::MealDbClient;
use cookbook_core::models::Recipe;
use cookbook_core::service::CookbookService;

use super::helpers::{json_error, print_recipe_detail, print_recipe_table};
use super::pick_recipe;

pub(crate) async fn cmd_search(client: &MealDbClient, term: &str, json: bool) -> Result<()> {
    let results = client.search(term).await;

    if results.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{term}'");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let refs: Vec<&Recipe> = results.iter().collect();
        print_recipe_table(&refs);
    }

    Ok(())
}

pub(crate) async fn cmd_save(
    svc: &CookbookService,
    client: &MealDbClient,
    term: &str,
    json: bool,
) -> Result<()> {
    let recipe = pick_recipe(client, term, json).await?;
    let saved = svc.save_recipe(&recipe)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        let name = &saved.name;
        let id = &saved.id;
        println!("Saved recipe: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) async fn cmd_random(
    svc: &CookbookService,
    client: &MealDbClient,
    save: bool,
    json: bool,
) -> Result<()> {
    let Some(recipe) = client.random().await else {
        if json {
            println!("{}", json_error("No random recipe available"));
        } else {
            eprintln!("No random recipe available");
        }
        process::exit(2);
    };

    let recipe = if save {
        svc.save_recipe(&recipe)?
    } else {
        recipe
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        print_recipe_detail(&recipe);
        if save {
            println!("\nSaved to your cookbook.");
        } else {
            let id = &recipe.id;
            println!("\nKeep it with: cookbook save \"{}\"  (id: {id})", recipe.name);
        }
    }
    Ok(())
}
