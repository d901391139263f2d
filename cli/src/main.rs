mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    Service, cmd_food_list, cmd_history, cmd_log_add, cmd_log_clear, cmd_log_remove,
    cmd_log_show, cmd_meal_add, cmd_meal_add_food, cmd_meal_clear, cmd_meal_remove,
    cmd_meal_remove_food, cmd_plan_show,
};
use crate::config::Config;
use macroplan_core::store::JsonFileStore;

#[derive(Parser)]
#[command(
    name = "macroplan",
    version,
    about = "Plan your daily meals and track what you actually eat",
    long_about = "Build a daily meal plan from a food catalog, log what you eat each day, \
                  and see how far you are from the plan's calories and macros."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the meal plan with per-meal and daily totals
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the meal plan
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Record what you ate on a given day
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Show consumption against the plan for the last N days
    History {
        /// Number of days to show (1 to 3650)
        #[arg(
            short,
            long,
            default_value = "7",
            value_parser = clap::value_parser!(u32).range(1..=3650)
        )]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Add an empty meal to the plan
    Add {
        /// Meal name (e.g. "Breakfast", "Afternoon snack")
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a meal and all of its foods
    Remove {
        /// Meal name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food to a meal
    AddFood {
        /// Meal name
        meal: String,
        /// Food name from the catalog
        food: String,
        /// Quantity in grams (e.g. "200" or "200g")
        grams: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a food from a meal by its number in `plan`
    RemoveFood {
        /// Meal name
        meal: String,
        /// Entry number as shown by `macroplan plan`
        number: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every meal from the plan
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Log a food you ate
    Add {
        /// Food name from the catalog
        food: String,
        /// Quantity in grams (e.g. "200" or "200g")
        grams: String,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's log with totals and the difference from the plan
    Show {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one entry by its number in `log show`
    Remove {
        /// Entry number as shown by `macroplan log show`
        number: usize,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry for a day
    Clear {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List/search the food catalog
    List {
        /// Search query to filter foods
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("macroplan=warn,macroplan_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let catalog = config.load_catalog()?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        foods = catalog.len(),
        max_grams = config.max_grams,
        "starting"
    );
    let mut svc: Service = Service::new(catalog, JsonFileStore::new(&config.data_dir))
        .with_max_grams(config.max_grams);

    match cli.command {
        Commands::Plan { json } => cmd_plan_show(&svc, json),
        Commands::Meal { command } => match command {
            MealCommands::Add { name, json } => cmd_meal_add(&mut svc, &name, json),
            MealCommands::Remove { name, json } => cmd_meal_remove(&mut svc, &name, json),
            MealCommands::AddFood {
                meal,
                food,
                grams,
                json,
            } => cmd_meal_add_food(&mut svc, &meal, &food, &grams, json),
            MealCommands::RemoveFood { meal, number, json } => {
                cmd_meal_remove_food(&mut svc, &meal, number, json)
            }
            MealCommands::Clear { json } => cmd_meal_clear(&mut svc, json),
        },
        Commands::Log { command } => match command {
            LogCommands::Add {
                food,
                grams,
                date,
                json,
            } => cmd_log_add(&mut svc, &food, &grams, date, json),
            LogCommands::Show { date, json } => cmd_log_show(&svc, date, json),
            LogCommands::Remove { number, date, json } => {
                cmd_log_remove(&mut svc, number, date, json)
            }
            LogCommands::Clear { date, json } => cmd_log_clear(&mut svc, date, json),
        },
        Commands::History { days, json } => cmd_history(&svc, days, json),
        Commands::Food { command } => match command {
            FoodCommands::List { search, json } => {
                cmd_food_list(svc.catalog(), search.as_deref(), json)
            }
        },
    }
}
