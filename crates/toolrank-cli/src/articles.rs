//! `articles` command handlers.
//!
//! Multiple inputs given to `articles ingest` are processed concurrently,
//! bounded by `--concurrency`. Each input succeeds or fails on its own; the
//! command fails only when every input failed.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use futures::stream::{self, StreamExt};
use toolrank_core::ArticleStatus;
use toolrank_db::{ArticleFilter, ArticlePatch, ArticleRow};
use toolrank_ingest::{IngestError, IngestInput, IngestOutcome};
use toolrank_search::FileUpload;
use uuid::Uuid;

use crate::app::App;

const LABEL_CHARS: usize = 60;

/// Sub-commands available under `articles`.
#[derive(Debug, Subcommand)]
pub enum ArticlesCommands {
    /// Analyze and store one or more articles
    Ingest {
        /// Article URLs, article bodies with `--text`, or paths with `--file`
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Treat inputs as article text instead of URLs
        #[arg(long, conflicts_with = "file")]
        text: bool,
        /// Treat inputs as paths to text, Markdown, HTML or JSON files
        #[arg(long)]
        file: bool,
        /// Override the MIME type guessed from each file's extension
        #[arg(long, requires = "file")]
        mime_type: Option<String>,
        /// Show predicted ranking changes without writing anything
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        source_name: Option<String>,
        /// Inputs processed at the same time
        #[arg(long, default_value = "2")]
        concurrency: usize,
    },
    /// List articles, newest publication first
    List {
        #[arg(long, default_value = "active")]
        status: ArticleStatus,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "50")]
        limit: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Show one article by id or slug
    Show { article: String },
    /// Edit text fields; rankings are not recalculated
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated; replaces the existing tags
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Re-analyze stored content and replace the article's ranking changes
    Recalculate { id: Uuid },
    /// Roll back the article's ranking changes and delete it
    Delete {
        id: Uuid,
        /// Remove the row and its history instead of marking it deleted
        #[arg(long)]
        hard: bool,
    },
    /// Processing history of one article
    Logs { id: Uuid },
}

pub(crate) async fn dispatch(app: &App, command: ArticlesCommands) -> anyhow::Result<()> {
    match command {
        ArticlesCommands::Ingest {
            inputs,
            text,
            file,
            mime_type,
            dry_run,
            author,
            source_name,
            concurrency,
        } => {
            let mut prepared = Vec::with_capacity(inputs.len());
            for raw in inputs {
                let input = if file {
                    IngestInput::file(read_upload(&raw, mime_type.as_deref()).await?)
                } else if text {
                    IngestInput::text(raw)
                } else {
                    IngestInput::url(raw)
                };
                let mut input = input.dry_run(dry_run);
                input.metadata.author.clone_from(&author);
                input.metadata.source_name.clone_from(&source_name);
                prepared.push(input);
            }
            run_ingest(app, prepared, concurrency).await
        }
        ArticlesCommands::List {
            status,
            category,
            tag,
            limit,
            offset,
        } => {
            let filter = ArticleFilter {
                status,
                category,
                tag,
                limit,
                offset,
            };
            run_list(app, &filter).await
        }
        ArticlesCommands::Show { article } => run_show(app, &article).await,
        ArticlesCommands::Update {
            id,
            title,
            summary,
            category,
            tags,
        } => {
            let patch = ArticlePatch {
                title,
                summary,
                category,
                tags,
                ..ArticlePatch::default()
            };
            run_update(app, id, patch).await
        }
        ArticlesCommands::Recalculate { id } => {
            let outcome = app.articles.recalculate(id).await?;
            println!(
                "recalculated {id}: {} ranking change(s) across {} tool(s)",
                outcome.rankings_changed, outcome.tools_affected
            );
            Ok(())
        }
        ArticlesCommands::Delete { id, hard } => {
            let rolled_back = app.articles.delete(id, hard).await?;
            let kind = if hard { "hard" } else { "soft" };
            println!("{kind}-deleted {id}; rolled back {rolled_back} ranking change(s)");
            Ok(())
        }
        ArticlesCommands::Logs { id } => run_logs(app, id).await,
    }
}

/// Ingest every input, printing one line (or a dry-run report) per input.
///
/// # Errors
///
/// Returns an error only if every input failed.
async fn run_ingest(
    app: &App,
    inputs: Vec<IngestInput>,
    concurrency: usize,
) -> anyhow::Result<()> {
    let total = inputs.len();
    let service = &app.articles;
    let results: Vec<(String, Result<IngestOutcome, IngestError>)> = stream::iter(inputs)
        .map(|input| {
            let label = input_label(&input);
            async move { (label, service.ingest(input).await) }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut failed = 0usize;
    for (label, result) in results {
        match result {
            Ok(IngestOutcome::DryRun(report)) => {
                println!("dry-run {label}");
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(IngestOutcome::Ingested {
                article,
                ranking_changes,
            }) => {
                println!(
                    "ingested {} ({}): {ranking_changes} ranking change(s)",
                    article.slug, article.id
                );
            }
            Err(e) => {
                tracing::error!(input = %label, error = %e, "article ingestion failed");
                println!("failed {label}: {e}");
                failed += 1;
            }
        }
    }

    if failed == total {
        anyhow::bail!("all {failed} input(s) failed");
    }
    Ok(())
}

async fn read_upload(path: &str, mime_type: Option<&str>) -> anyhow::Result<FileUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let upload = FileUpload::new(file_name, bytes);
    Ok(match mime_type {
        Some(mime) => upload.with_mime_type(mime),
        None => upload,
    })
}

/// URL or file name as given, or the start of the text on one line.
fn input_label(input: &IngestInput) -> String {
    let flat = input.input.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= LABEL_CHARS {
        flat
    } else {
        let mut label: String = flat.chars().take(LABEL_CHARS).collect();
        label.push_str("...");
        label
    }
}

async fn run_list(app: &App, filter: &ArticleFilter) -> anyhow::Result<()> {
    let rows = app.articles.list(filter).await?;
    if rows.is_empty() {
        println!("no {} articles found", filter.status);
        return Ok(());
    }

    println!("{:<38}{:<12}{:<5}{:<18}TITLE", "ID", "PUBLISHED", "IMP", "CATEGORY");
    for row in &rows {
        println!(
            "{:<38}{:<12}{:<5}{:<18}{}",
            row.id,
            fmt_date(row),
            row.importance_score,
            row.category.as_deref().unwrap_or("-"),
            row.title
        );
    }
    Ok(())
}

fn fmt_date(row: &ArticleRow) -> String {
    row.published_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

async fn run_show(app: &App, key: &str) -> anyhow::Result<()> {
    let row = match Uuid::parse_str(key) {
        Ok(id) => app.articles.get(id).await?,
        Err(_) => app.articles.get_by_slug(key).await?,
    }
    .ok_or_else(|| anyhow::anyhow!("article '{key}' not found"))?;

    println!("{} ({})", row.title, row.slug);
    println!("  id          {}", row.id);
    println!("  status      {}", row.status);
    println!("  published   {}", fmt_date(&row));
    let source = row
        .source_url
        .as_deref()
        .or(row.source_name.as_deref())
        .unwrap_or("-");
    println!("  source      {source}");
    println!("  importance  {}", row.importance_score);
    if let Some(sentiment) = row.sentiment_score {
        println!("  sentiment   {sentiment}");
    }
    if !row.tags.is_empty() {
        println!("  tags        {}", row.tags.join(", "));
    }
    println!(
        "  ingested by {} at {}",
        row.ingested_by,
        row.ingested_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(summary) = &row.summary {
        println!();
        println!("{summary}");
    }

    let impact = app.ledger().impact(row.id).await?;
    println!();
    println!(
        "ranking impact: {} tool(s), {} improved, {} declined, avg score change {:.3}",
        impact.tools_affected, impact.improved, impact.declined, impact.average_score_change
    );
    Ok(())
}

async fn run_update(app: &App, id: Uuid, patch: ArticlePatch) -> anyhow::Result<()> {
    if patch.title.is_none()
        && patch.summary.is_none()
        && patch.category.is_none()
        && patch.tags.is_none()
    {
        anyhow::bail!("nothing to update; pass --title, --summary, --category or --tags");
    }
    let row = app.articles.update(id, patch).await?;
    println!("updated {} ({})", row.slug, row.id);
    Ok(())
}

async fn run_logs(app: &App, id: Uuid) -> anyhow::Result<()> {
    let logs = app.articles.processing_logs(id).await?;
    if logs.is_empty() {
        println!("no processing logs for {id}");
        return Ok(());
    }

    println!("{:<13}{:<11}{:<18}{:>10}  ERROR", "ACTION", "STATUS", "STARTED", "MS");
    for log in &logs {
        println!(
            "{:<13}{:<11}{:<18}{:>10}  {}",
            log.action,
            log.status,
            log.started_at.format("%Y-%m-%d %H:%M").to_string(),
            log.duration_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string()),
            log.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_inputs_label_as_is() {
        let input = IngestInput::url("https://example.com/post");
        assert_eq!(input_label(&input), "https://example.com/post");
    }

    #[test]
    fn long_text_label_is_flattened_and_cut() {
        let body = format!("Cursor\nlaunches   agents {}", "x".repeat(100));
        let label = input_label(&IngestInput::text(body));
        assert!(label.starts_with("Cursor launches agents "));
        assert!(label.ends_with("..."));
        assert_eq!(label.chars().count(), LABEL_CHARS + 3);
    }

    #[tokio::test]
    async fn uploads_are_named_after_the_file() {
        let dir = std::env::temp_dir().join(format!("toolrank-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("launch.md");
        tokio::fs::write(&path, "# Cursor 2.0").await.unwrap();
        let path = path.to_str().unwrap();

        let upload = read_upload(path, None).await.unwrap();
        assert_eq!(upload.file_name, "launch.md");
        assert_eq!(upload.mime_type, "text/markdown");
        assert_eq!(upload.bytes, b"# Cursor 2.0");
        let input = IngestInput::file(upload);
        assert_eq!(input_label(&input), "launch.md");

        let forced = read_upload(path, Some("text/plain")).await.unwrap();
        assert_eq!(forced.mime_type, "text/plain");
        assert!(read_upload("/nonexistent/toolrank.md", None).await.is_err());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
