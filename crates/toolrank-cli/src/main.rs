mod app;
mod articles;
mod ledger;
mod run;
mod schedule;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::articles::ArticlesCommands;
use crate::ledger::{LedgerCommands, VersionsCommands};
use crate::run::{RunArgs, RunsCommands};

#[derive(Debug, Parser)]
#[command(name = "toolrank")]
#[command(about = "AI coding tool news ingestion and ranking ledger")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the discovery pipeline once
    Run(RunArgs),
    /// Inspect past ingestion runs
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Ingest, edit and remove individual articles
    Articles {
        #[command(subcommand)]
        command: ArticlesCommands,
    },
    /// Per-article ranking changes
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Full ranking snapshots
    Versions {
        #[command(subcommand)]
        command: VersionsCommands,
    },
    /// Run the daily discovery pipeline on `TOOLRANK_DAILY_SCHEDULE` until interrupted
    Schedule,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("no command given; see `toolrank --help`");
        return Ok(());
    };

    let config = toolrank_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = toolrank_db::PoolConfig::from_app_config(&config);
    let pool = toolrank_db::connect_pool(&config.database_url, pool_config).await?;

    let app = App::build(config, pool)?;
    match command {
        Commands::Run(args) => run::run_ingestion(&app, &args).await,
        Commands::Runs { command } => match command {
            RunsCommands::List { limit } => run::run_runs_list(&app, limit).await,
            RunsCommands::Show { id } => run::run_runs_show(&app, id).await,
        },
        Commands::Articles { command } => articles::dispatch(&app, command).await,
        Commands::Ledger { command } => ledger::dispatch_ledger(&app, command).await,
        Commands::Versions { command } => ledger::dispatch_versions(&app, command).await,
        Commands::Schedule => schedule::run_schedule(&app).await,
        Commands::Db { command } => run_db(&app.pool, &command).await,
    }
}

async fn run_db(pool: &sqlx::PgPool, command: &DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            toolrank_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = toolrank_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
