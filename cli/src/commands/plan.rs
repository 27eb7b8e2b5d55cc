use anyhow::Result;
use std::process;

use cookbook_core::service::CookbookService;

use super::helpers::{exit_not_found, parse_assignment, print_plan_table, print_shopping_table};

const NOTHING_TO_LIST: &str = "Nothing to list: no planned meal has ingredients";

/// Fill plan slots from saved recipes, then print the week and its shopping list.
pub(crate) fn cmd_plan(
    svc: &mut CookbookService,
    assignments: &[String],
    csv: bool,
    json: bool,
) -> Result<()> {
    let parsed = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;

    for (slot, id) in parsed {
        if svc.get_recipe(&id)?.is_none() {
            exit_not_found(&format!("Recipe {id} not found"), json);
        }
        svc.assign_slot(slot, &id)?;
    }

    let list = svc.shopping_list();

    if csv {
        let Some(list) = list else {
            eprintln!("{NOTHING_TO_LIST}");
            process::exit(2);
        };
        list.write_csv(std::io::stdout().lock())?;
        return Ok(());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "plan": svc.plan(),
                "shopping_list": &list,
            }))?
        );
        if list.is_none() {
            process::exit(2);
        }
        return Ok(());
    }

    print_plan_table(svc.plan());
    match list {
        Some(list) => {
            println!("\nShopping list");
            print_shopping_table(&list);
            Ok(())
        }
        None => {
            eprintln!("\n{NOTHING_TO_LIST}");
            process::exit(2);
        }
    }
}
