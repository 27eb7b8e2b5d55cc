use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cookbook_core::models::Recipe;
use cookbook_core::planner::{MealPlan, MealTime, SlotKey};
use cookbook_core::shopping::ShoppingList;

/// Parse `<slot>=<recipe id>`, e.g. `monday-lunch=52771`.
pub(crate) fn parse_assignment(s: &str) -> Result<(SlotKey, String)> {
    let (slot, id) = s.split_once('=').with_context(|| {
        format!("Invalid assignment '{s}'. Use 'slot=recipe-id' (e.g. 'monday-lunch=52771')")
    })?;
    let slot: SlotKey = slot.parse()?;
    let id = id.trim();
    if id.is_empty() {
        bail!("Missing recipe id in '{s}'");
    }
    Ok((slot, id.to_string()))
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a recipe (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    Ok(matches!(line?.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Report a missing record and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn print_recipe_table(recipes: &[&Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: i + 1,
            id: truncate(&r.id, 12),
            name: truncate(&r.name, 40),
            category: r.category.as_deref().unwrap_or("-").to_string(),
            ingredients: r.ingredients.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_recipe_detail(recipe: &Recipe) {
    println!("{} (id: {})", recipe.name, recipe.id);
    if let Some(category) = &recipe.category {
        println!("Category: {category}");
    }
    if let Some(url) = &recipe.source_url {
        println!("Source:   {url}");
    }
    if let Some(url) = &recipe.thumbnail_url {
        println!("Image:    {url}");
    }

    if !recipe.ingredients.is_empty() {
        #[derive(Tabled)]
        struct IngredientRow {
            #[tabled(rename = "Ingredient")]
            name: String,
            #[tabled(rename = "Measure")]
            measure: String,
        }

        let rows: Vec<IngredientRow> = recipe
            .ingredients
            .iter()
            .map(|i| IngredientRow {
                name: i.name.clone(),
                measure: i.measure.clone().unwrap_or_default(),
            })
            .collect();
        println!("\n{}", Table::new(&rows).with(Style::rounded()));
    }

    if let Some(instructions) = &recipe.instructions {
        println!("\n{instructions}");
    }
}

pub(crate) fn print_plan_table(plan: &MealPlan) {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Lunch")]
        lunch: String,
        #[tabled(rename = "Dinner")]
        dinner: String,
    }

    let cell = |slot: SlotKey| {
        plan.get(slot)
            .map_or_else(|| "-".to_string(), |r| truncate(&r.name, 30))
    };

    let rows: Vec<DayRow> = SlotKey::all()
        .filter(|slot| slot.meal == MealTime::Lunch)
        .map(|lunch| DayRow {
            day: lunch.day.to_string(),
            lunch: cell(lunch),
            dinner: cell(SlotKey::new(lunch.day, MealTime::Dinner)),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_shopping_table(list: &ShoppingList) {
    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Measures")]
        measures: String,
        #[tabled(rename = "Recipes")]
        recipes: String,
        #[tabled(rename = "x")]
        occurrences: usize,
    }

    let rows: Vec<ItemRow> = list
        .items
        .iter()
        .map(|item| ItemRow {
            name: truncate(&item.name, 30),
            measures: truncate(&item.measures.join(", "), 40),
            recipes: truncate(&item.recipes.join(", "), 40),
            occurrences: item.occurrences,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!(
        "{} ingredients across {} planned meals",
        list.items.len(),
        list.planned_meals
    );
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
