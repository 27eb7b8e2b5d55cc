mod commands;
mod config;
mod server;
mod themealdb;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_delete, cmd_edit, cmd_list, cmd_plan, cmd_random, cmd_save, cmd_search, cmd_show,
};
use crate::config::Config;
use crate::themealdb::MealDbClient;
use cookbook_core::service::CookbookService;

#[derive(Parser)]
#[command(
    name = "cookbook",
    version,
    about = "A local-first recipe manager with a weekly meal planner",
    long_about = "Search TheMealDB, keep the recipes you like in a local cookbook, \
                  and plan lunches and dinners for the week with a shopping list."
)]
struct Cli {
    /// Use the bundled sample meals instead of TheMealDB
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search TheMealDB for recipes by name
    Search {
        /// Search term
        term: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search TheMealDB and save a result to your cookbook
    Save {
        /// Search term
        term: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a random recipe
    Random {
        /// Save it to your cookbook
        #[arg(long)]
        save: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a saved recipe
    Show {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a saved recipe's name or instructions
    Edit {
        /// Recipe ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New instructions
        #[arg(long)]
        instructions: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved recipe
    Delete {
        /// Recipe ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan meals for the week and print the shopping list
    Plan {
        /// Slot assignment "slot=recipe-id" (e.g. "monday-lunch=52771"); repeatable
        #[arg(short, long = "assign", value_name = "SLOT=ID")]
        assignments: Vec<String>,
        /// Write the shopping list as CSV to stdout
        #[arg(long, conflicts_with = "json")]
        csv: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    init_tracing(default_level);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut svc = CookbookService::open(&config.db_path, &config.kv_path)?;
    let client = MealDbClient::new(&config.api_url, cli.offline);

    match cli.command {
        Commands::Search { term, json } => cmd_search(&client, &term, json).await,
        Commands::Save { term, json } => cmd_save(&svc, &client, &term, json).await,
        Commands::Random { save, json } => cmd_random(&svc, &client, save, json).await,
        Commands::List { json } => cmd_list(&svc, json),
        Commands::Show { id, json } => cmd_show(&svc, &id, json),
        Commands::Edit {
            id,
            name,
            instructions,
            json,
        } => cmd_edit(&svc, &id, name, instructions, json),
        Commands::Delete { id, yes, json } => cmd_delete(&svc, &id, yes, json),
        Commands::Plan {
            assignments,
            csv,
            json,
        } => cmd_plan(&mut svc, &assignments, csv, json),
        Commands::Serve { port, bind } => server::start_server(svc, client, port, &bind).await,
    }
}
