//! `run` and `runs` command handlers.

use clap::{Args, Subcommand};
use toolrank_core::{RunStatus, RunType};
use toolrank_ingest::{IngestionResult, RunOptions};
use uuid::Uuid;

use crate::app::App;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Discover, assess and analyze without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Maximum number of articles to ingest (defaults to `TOOLRANK_MAX_ARTICLES`)
    #[arg(long)]
    pub max_articles: Option<usize>,
    /// Minimum average quality score for this run only
    #[arg(long)]
    pub quality_threshold: Option<f64>,
    /// Ingest every article with readable content
    #[arg(long)]
    pub skip_quality_check: bool,
    /// daily_news, monthly_summary or manual
    #[arg(long, default_value = "manual")]
    pub run_type: RunType,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            max_articles: self.max_articles,
            quality_threshold: self.quality_threshold,
            skip_quality_check: self.skip_quality_check,
            run_type: self.run_type,
        }
    }
}

/// Sub-commands available under `runs`.
#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// Most recent runs first
    List {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Counters, errors and ingested articles of one run
    Show { id: Uuid },
}

/// Trigger one pipeline run and print its summary.
///
/// # Errors
///
/// Returns an error when the run ends `failed`, after the summary is printed.
pub(crate) async fn run_ingestion(app: &App, args: &RunArgs) -> anyhow::Result<()> {
    let result = app.orchestrator.trigger_run(args.options()).await;
    print_result(&result);
    if result.status == RunStatus::Failed {
        anyhow::bail!("ingestion run failed");
    }
    Ok(())
}

fn print_result(result: &IngestionResult) {
    let run_id = if result.run_id.is_empty() {
        "(not recorded)"
    } else {
        result.run_id.as_str()
    };
    println!("run {run_id}: {}", result.status);
    println!(
        "  discovered {}  passed quality {}  ingested {}  skipped {}",
        result.articles_discovered,
        result.articles_passed_quality,
        result.articles_ingested,
        result.articles_skipped
    );
    if result.articles_degraded > 0 {
        println!(
            "  degraded assessments {} (rejected by default)",
            result.articles_degraded
        );
    }
    println!("  ranking changes {}", result.ranking_changes);
    println!("  estimated cost ${}", result.estimated_cost_usd);
    println!("  duration {} ms", result.duration_ms);
    for id in &result.ingested_article_ids {
        println!("  + {id}");
    }
    for error in &result.errors {
        println!("  ! {error}");
    }
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs_list(app: &App, limit: i64) -> anyhow::Result<()> {
    let runs = app.store.list_ingestion_runs(limit).await?;
    if runs.is_empty() {
        println!("no ingestion runs yet; start one with `toolrank run`");
        return Ok(());
    }

    println!(
        "{:<38}{:<17}{:<11}{:<18}{:>9}{:>10}",
        "ID", "TYPE", "STATUS", "STARTED", "INGESTED", "COST"
    );
    for run in &runs {
        println!(
            "{:<38}{:<17}{:<11}{:<18}{:>9}{:>10}",
            run.id,
            run.run_type,
            run.status,
            run.started_at.format("%Y-%m-%d %H:%M").to_string(),
            run.articles_ingested,
            format!("${}", run.estimated_cost_usd),
        );
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the run does not exist or the query fails.
pub(crate) async fn run_runs_show(app: &App, id: Uuid) -> anyhow::Result<()> {
    let run = app
        .store
        .get_ingestion_run(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("ingestion run {id} not found"))?;

    println!("run {} ({}): {}", run.id, run.run_type, run.status);
    println!("  started   {}", run.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(done) = run.completed_at {
        println!("  completed {}", done.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(query) = &run.search_query {
        println!("  query     {query}");
    }
    println!(
        "  discovered {}  passed quality {}  ingested {}  skipped {}",
        run.articles_discovered,
        run.articles_passed_quality,
        run.articles_ingested,
        run.articles_skipped
    );
    if run.articles_degraded > 0 {
        println!("  degraded assessments {}", run.articles_degraded);
    }
    println!("  ranking changes {}", run.ranking_changes);
    println!("  estimated cost ${}", run.estimated_cost_usd);

    for id in json_strings(&run.ingested_article_ids) {
        println!("  + {id}");
    }
    for error in json_strings(&run.error_log) {
        println!("  ! {error}");
    }
    Ok(())
}

/// String entries of a JSON array column; anything else is skipped.
fn json_strings(value: &serde_json::Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(serde_json::Value::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_strings_skips_non_strings() {
        let value = serde_json::json!(["a", 1, null, "b"]);
        assert_eq!(json_strings(&value), ["a", "b"]);
        assert!(json_strings(&serde_json::json!({})).is_empty());
    }
}
