//! CLI for mealrec.
//!
//! Without a subcommand it starts the interactive session. The other commands
//! run a single recommendation round, print the stored counters, or clear them.

mod config;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::DataPaths;
use mealrec_core::{Phase, Recommendation, RecommendationPolicy, ResetConfirmation};
use mealrec_recommender::{phase_for, Recommender};
use mealrec_store::{load_menu, load_preferences, save_preferences};
use serde::Serialize;
use session::{Session, SessionContext};
use std::io;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Menu file, one `Cuisine,Dish` pair per line
    #[arg(long, global = true, env = "MEALREC_MENU_FILE", default_value = "data/menu.txt")]
    menu_file: PathBuf,

    /// Preference file (JSON)
    #[arg(
        long,
        global = true,
        env = "MEALREC_PREFERENCE_FILE",
        default_value = "data/user_preference.json"
    )]
    preference_file: PathBuf,

    /// Seed for reproducible recommendations
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session (default)
    Run,
    /// Recommend dishes once; records the offer but no selection
    Recommend {
        /// Cuisine to recommend from (random if omitted)
        #[arg(long)]
        cuisine: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored preference counters
    Stats {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear all stored preferences
    Reset {
        /// Confirm the reset; without it nothing is changed
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Serialize)]
struct RecommendationRecord<'a> {
    #[serde(with = "time::serde::iso8601")]
    ts: OffsetDateTime,
    total_selections: u64,
    recommendation: &'a Recommendation,
}

#[derive(Serialize)]
struct DishStats {
    cuisine: String,
    name: String,
    selection_count: u64,
    recommendation_count: u64,
    on_menu: bool,
}

#[derive(Serialize)]
struct StatsReport {
    total_selections: u64,
    phase: Phase,
    dishes: Vec<DishStats>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_session(paths: DataPaths, recommender: Recommender) -> Result<()> {
    let ctx = SessionContext::load(paths, recommender);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(ctx, stdin.lock(), stdout.lock());
    session.run().context("Interactive session failed")
}

fn recommend_once(
    paths: DataPaths,
    recommender: Recommender,
    cuisine: Option<String>,
    json: bool,
) -> Result<()> {
    let mut ctx = SessionContext::load(paths, recommender);
    let cuisine = match cuisine {
        Some(cuisine) => cuisine,
        None => ctx
            .recommender
            .pick_cuisine(&ctx.menu)
            .context("Menu has no cuisines")?,
    };
    let recommendation = ctx
        .recommender
        .recommend(&ctx.menu, &mut ctx.prefs, &cuisine)?;
    ctx.flush().context("Failed to save preferences")?;

    if json {
        let record = RecommendationRecord {
            ts: OffsetDateTime::now_utc(),
            total_selections: ctx.prefs.total_selections(),
            recommendation: &recommendation,
        };
        serde_json::to_writer_pretty(io::stdout(), &record)?;
        println!();
    } else {
        println!("Recommended dishes of {}:", recommendation.cuisine);
        for (i, dish) in recommendation.dishes().enumerate() {
            println!("{}. {}", i + 1, dish.name);
        }
    }
    Ok(())
}

fn show_stats(paths: &DataPaths, json: bool) -> Result<()> {
    let menu = load_menu(&paths.menu_file).menu;
    let prefs = load_preferences(&paths.preference_file).store;

    let mut dishes: Vec<DishStats> = prefs
        .iter()
        .map(|(dish, record)| DishStats {
            cuisine: dish.cuisine.clone(),
            name: dish.name.clone(),
            selection_count: record.selection_count,
            recommendation_count: record.recommendation_count,
            on_menu: menu.contains(dish),
        })
        .collect();
    dishes.sort_by(|a, b| {
        b.selection_count
            .cmp(&a.selection_count)
            .then(b.recommendation_count.cmp(&a.recommendation_count))
    });
    let report = StatsReport {
        total_selections: prefs.total_selections(),
        phase: phase_for(prefs.total_selections()),
        dishes,
    };

    if json {
        serde_json::to_writer_pretty(io::stdout(), &report)?;
        println!();
        return Ok(());
    }
    println!(
        "Total selections: {} ({:?} phase)",
        report.total_selections, report.phase
    );
    println!("{:>9} {:>11}  dish", "selected", "recommended");
    for d in &report.dishes {
        let note = if d.on_menu { "" } else { " [not on menu]" };
        println!(
            "{:>9} {:>11}  {} ({}){note}",
            d.selection_count, d.recommendation_count, d.name, d.cuisine
        );
    }
    Ok(())
}

fn reset_preferences(paths: &DataPaths, yes: bool) -> Result<()> {
    let mut prefs = load_preferences(&paths.preference_file).store;
    let confirmation = if yes {
        ResetConfirmation::Confirmed
    } else {
        ResetConfirmation::Declined
    };
    if !prefs.reset(confirmation) {
        println!("Reset not confirmed; pass --yes to clear all preferences.");
        return Ok(());
    }
    save_preferences(&paths.preference_file, &mut prefs).context("Failed to save preferences")?;
    println!("User preferences have been reset successfully!");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = DataPaths::new(cli.menu_file, cli.preference_file)?;
    let recommender = cli.seed.map_or_else(Recommender::new, Recommender::seeded);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_session(paths, recommender),
        Commands::Recommend { cuisine, json } => recommend_once(paths, recommender, cuisine, json),
        Commands::Stats { json } => show_stats(&paths, json),
        Commands::Reset { yes } => reset_preferences(&paths, yes),
    }
}
