mod commands;
mod config;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    cmd_checkin, cmd_forecast, cmd_goal_add, cmd_goal_done, cmd_goal_list, cmd_goal_progress,
    cmd_insights, cmd_journal_add, cmd_journal_delete, cmd_journal_list, cmd_metrics_log,
    cmd_metrics_show, cmd_quota_plan, cmd_quota_show, cmd_shopping_add, cmd_shopping_remove,
    cmd_shopping_show, cmd_shopping_toggle, cmd_water,
};
use crate::config::Config;
use verve_core::remote::{LogSink, MemoryDocumentStore};
use verve_core::storage::SqliteStorage;
use verve_core::stores::SyncContext;

#[derive(Parser)]
#[command(
    name = "verve",
    version,
    about = "A local-first wellness tracker CLI",
    long_about = "\nTrack health metrics, check-ins, goals, and journals locally,\nwith derived forecasts and correlation insights.\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a wellness check-in
    Checkin {
        /// Mood: excellent, good, okay, low, struggling
        mood: String,
        /// Stress level (0-10)
        #[arg(long, default_value = "5")]
        stress: f64,
        /// Energy level (0-10)
        #[arg(long, default_value = "5")]
        energy: f64,
        /// Sleep quality (1-10)
        #[arg(long, default_value = "5")]
        sleep_quality: f64,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log and inspect daily health metrics
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },
    /// Log water intake in liters
    Water {
        /// Liters to add (e.g. 0.25)
        liters: f64,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forecast tomorrow's wellness from recent history
    Forecast {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show correlation insights and anomalies
    Insights {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the shopping list
    Shopping {
        #[command(subcommand)]
        command: ShoppingCommands,
    },
    /// Manage journal entries
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    /// Manage goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Show or configure usage quotas
    Quota {
        #[command(subcommand)]
        command: QuotaCommands,
    },
}

#[derive(Subcommand)]
enum MetricsCommands {
    /// Log metrics for a day (unset fields keep their current value)
    Log {
        /// Step count
        #[arg(long)]
        steps: Option<f64>,
        /// Sleep hours
        #[arg(long)]
        sleep: Option<f64>,
        /// Resting heart rate
        #[arg(long)]
        heart_rate: Option<f64>,
        /// Calories consumed
        #[arg(long)]
        calories: Option<f64>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current metrics with 7-day averages and trends
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ShoppingCommands {
    /// Add an item
    Add {
        /// Item name
        name: String,
        /// Category (e.g. produce, dairy)
        #[arg(long)]
        category: Option<String>,
        /// Amount (e.g. "2", "500g")
        #[arg(long)]
        amount: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle an item's checked state (by id prefix or name)
    Toggle {
        /// Item id prefix or exact name
        item: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an item (by id prefix or name)
    Remove {
        /// Item id prefix or exact name
        item: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the list
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Add an entry
    Add {
        /// Entry text
        content: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Mood label
        #[arg(long)]
        mood: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by id prefix
    Delete {
        /// Entry id prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Add a goal
    Add {
        /// Goal title
        title: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Category: business, personal, health, learning
        #[arg(long, default_value = "personal")]
        category: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List goals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a goal's progress percentage
    Progress {
        /// Goal id prefix or exact title
        goal: String,
        /// Progress (0-100)
        percent: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a goal as completed
    Done {
        /// Goal id prefix or exact title
        goal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum QuotaCommands {
    /// Show usage against the current plan's limits
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch the subscription plan (resets counters)
    Plan {
        /// Plan: free, basic, pro, premium
        plan: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let storage = SqliteStorage::open(&config.db_path)?;
    // No remote account wired up in the CLI session: stores run local-only
    // against an in-memory mirror.
    let context = SyncContext::new(
        Arc::new(storage),
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(LogSink),
    );

    match cli.command {
        Commands::Checkin {
            mood,
            stress,
            energy,
            sleep_quality,
            notes,
            json,
        } => cmd_checkin(&context, &mood, stress, energy, sleep_quality, notes, json),
        Commands::Metrics { command } => match command {
            MetricsCommands::Log {
                steps,
                sleep,
                heart_rate,
                calories,
                date,
                json,
            } => cmd_metrics_log(&context, steps, sleep, heart_rate, calories, date, json),
            MetricsCommands::Show { json } => cmd_metrics_show(&context, json),
        },
        Commands::Water { liters, date, json } => cmd_water(&context, liters, date, json),
        Commands::Forecast { json } => cmd_forecast(&context, json),
        Commands::Insights { json } => cmd_insights(&context, json),
        Commands::Shopping { command } => match command {
            ShoppingCommands::Add {
                name,
                category,
                amount,
                json,
            } => cmd_shopping_add(&context, &name, category, amount, json),
            ShoppingCommands::Toggle { item, json } => cmd_shopping_toggle(&context, &item, json),
            ShoppingCommands::Remove { item, json } => cmd_shopping_remove(&context, &item, json),
            ShoppingCommands::Show { json } => cmd_shopping_show(&context, json),
        },
        Commands::Journal { command } => match command {
            JournalCommands::Add {
                content,
                tags,
                mood,
                json,
            } => cmd_journal_add(&context, &content, tags, mood, json),
            JournalCommands::List { json } => cmd_journal_list(&context, json),
            JournalCommands::Delete { id, json } => cmd_journal_delete(&context, &id, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Add {
                title,
                description,
                category,
                deadline,
                json,
            } => cmd_goal_add(&context, &title, description, &category, deadline, json),
            GoalCommands::List { json } => cmd_goal_list(&context, json),
            GoalCommands::Progress { goal, percent, json } => {
                cmd_goal_progress(&context, &goal, percent, json)
            }
            GoalCommands::Done { goal, json } => cmd_goal_done(&context, &goal, json),
        },
        Commands::Quota { command } => match command {
            QuotaCommands::Show { json } => cmd_quota_show(&context, json),
            QuotaCommands::Plan { plan, json } => cmd_quota_plan(&context, &plan, json),
        },
    }
}
