//! `ledger` and `versions` command handlers.

use clap::Subcommand;
use toolrank_db::RankingChangeRow;
use toolrank_ingest::VersionRequest;
use uuid::Uuid;

use crate::app::App;

/// Sub-commands available under `ledger`.
#[derive(Debug, Subcommand)]
pub enum LedgerCommands {
    /// Every change recorded for one article, newest first
    Show { article_id: Uuid },
    /// Undo an article's ranking changes without deleting it
    Rollback { article_id: Uuid },
    /// Latest applied changes across all articles
    Recent {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

/// Sub-commands available under `versions`.
#[derive(Debug, Subcommand)]
pub enum VersionsCommands {
    /// Snapshot the current ranking as the next version
    Create {
        #[arg(long)]
        summary: Option<String>,
        /// Article that prompted this version
        #[arg(long)]
        article: Option<Uuid>,
        #[arg(long, default_value = "admin")]
        created_by: String,
    },
    /// Most recent versions first
    List {
        #[arg(long, default_value = "10")]
        limit: i64,
    },
}

pub(crate) async fn dispatch_ledger(app: &App, command: LedgerCommands) -> anyhow::Result<()> {
    match command {
        LedgerCommands::Show { article_id } => {
            let changes = app.ledger().changes_for_article(article_id).await?;
            if changes.is_empty() {
                println!("no ranking changes recorded for {article_id}");
                return Ok(());
            }
            print_changes(&changes, false);

            let impact = app.ledger().impact(article_id).await?;
            println!();
            println!(
                "live: {} tool(s), avg rank change {:.2}, avg score change {:.3}, {} improved, {} declined, {} new",
                impact.tools_affected,
                impact.average_rank_change,
                impact.average_score_change,
                impact.improved,
                impact.declined,
                impact.new_entries
            );
        }
        LedgerCommands::Rollback { article_id } => {
            let count = app.articles.rollback(article_id).await?;
            println!("rolled back {count} ranking change(s) for {article_id}");
        }
        LedgerCommands::Recent { limit } => {
            let changes = app.ledger().recent_changes(limit).await?;
            if changes.is_empty() {
                println!("no applied ranking changes");
                return Ok(());
            }
            print_changes(&changes, true);
        }
    }
    Ok(())
}

fn print_changes(changes: &[RankingChangeRow], with_article: bool) {
    let article_header = if with_article { "ARTICLE" } else { "" };
    println!(
        "{:<24}{:>5}{:>5}{:>7}{:>10}  {:<11}{:<13}{}",
        "TOOL", "OLD", "NEW", "RANK", "SCORE", "TYPE", "STATE", article_header
    );
    for change in changes {
        let state = if change.rolled_back {
            "rolled back"
        } else if change.is_applied {
            "applied"
        } else {
            "pending"
        };
        let article = if with_article {
            change.article_id.to_string()
        } else {
            String::new()
        };
        println!(
            "{:<24}{:>5}{:>5}{:>+7}{:>10}  {:<11}{:<13}{}",
            change.tool_name,
            fmt_rank(change.old_rank),
            fmt_rank(change.new_rank),
            change.rank_change,
            change.score_change.to_string(),
            change.change_type,
            state,
            article
        );
    }
}

fn fmt_rank(rank: Option<i32>) -> String {
    rank.map_or_else(|| "-".to_string(), |r| r.to_string())
}

pub(crate) async fn dispatch_versions(app: &App, command: VersionsCommands) -> anyhow::Result<()> {
    match command {
        VersionsCommands::Create {
            summary,
            article,
            created_by,
        } => {
            let version = app
                .ledger()
                .create_version(VersionRequest {
                    article_id: article,
                    changes_summary: summary,
                    created_by,
                    ..VersionRequest::default()
                })
                .await?;
            let tools = version
                .rankings_snapshot
                .as_array()
                .map_or(0, Vec::len);
            println!("created version {} ({tools} tools)", version.version);
        }
        VersionsCommands::List { limit } => {
            let versions = app.ledger().list_versions(limit).await?;
            if versions.is_empty() {
                println!("no ranking versions yet; create one with `toolrank versions create`");
                return Ok(());
            }
            println!("{:<10}{:<18}{:<12}SUMMARY", "VERSION", "CREATED", "BY");
            for v in &versions {
                println!(
                    "{:<10}{:<18}{:<12}{}",
                    v.version,
                    v.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    v.created_by,
                    v.changes_summary.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rank_prints_dash() {
        assert_eq!(fmt_rank(None), "-");
        assert_eq!(fmt_rank(Some(3)), "3");
    }
}
