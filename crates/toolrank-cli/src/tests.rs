use super::*;
use toolrank_core::{ArticleStatus, RunType};
use toolrank_llm::{GenerationParams, LanguageModel, LlmError, Message, RetryPolicy};

use crate::app::UnconfiguredModel;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["toolrank"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_db_commands() {
    let cli = Cli::try_parse_from(["toolrank", "db", "ping"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));

    let cli = Cli::try_parse_from(["toolrank", "db", "migrate"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn run_defaults() {
    let cli = Cli::try_parse_from(["toolrank", "run"]).unwrap();
    let Some(Commands::Run(args)) = cli.command else {
        panic!("expected run command");
    };
    assert!(!args.dry_run);
    assert!(!args.skip_quality_check);
    assert_eq!(args.max_articles, None);
    assert_eq!(args.quality_threshold, None);
    assert_eq!(args.run_type, RunType::Manual);
}

#[test]
fn run_with_every_flag() {
    let cli = Cli::try_parse_from([
        "toolrank",
        "run",
        "--dry-run",
        "--max-articles",
        "5",
        "--quality-threshold",
        "6.5",
        "--skip-quality-check",
        "--run-type",
        "daily_news",
    ])
    .unwrap();
    let Some(Commands::Run(args)) = cli.command else {
        panic!("expected run command");
    };
    assert!(args.dry_run);
    assert!(args.skip_quality_check);
    assert_eq!(args.max_articles, Some(5));
    assert_eq!(args.quality_threshold, Some(6.5));
    assert_eq!(args.run_type, RunType::DailyNews);
}

#[test]
fn unknown_run_type_is_rejected() {
    assert!(Cli::try_parse_from(["toolrank", "run", "--run-type", "hourly"]).is_err());
}

#[test]
fn runs_show_requires_uuid() {
    assert!(Cli::try_parse_from(["toolrank", "runs", "show", "not-a-uuid"]).is_err());
    let id = uuid::Uuid::new_v4().to_string();
    let cli = Cli::try_parse_from(["toolrank", "runs", "show", id.as_str()]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Runs {
            command: RunsCommands::Show { id: parsed }
        }) if parsed.to_string() == id
    ));
}

#[test]
fn articles_ingest_takes_many_inputs() {
    let cli = Cli::try_parse_from([
        "toolrank",
        "articles",
        "ingest",
        "https://a.example/1",
        "https://a.example/2",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Articles {
            command: ArticlesCommands::Ingest {
                ref inputs,
                text: false,
                dry_run: true,
                concurrency: 2,
                ..
            }
        }) if inputs.len() == 2
    ));
}

#[test]
fn articles_ingest_reads_files() {
    let cli = Cli::try_parse_from([
        "toolrank",
        "articles",
        "ingest",
        "--file",
        "notes/launch.md",
        "--mime-type",
        "text/markdown",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Articles {
            command: ArticlesCommands::Ingest {
                file: true,
                text: false,
                mime_type: Some(ref mime),
                ..
            }
        }) if mime == "text/markdown"
    ));
}

#[test]
fn articles_ingest_file_and_text_conflict() {
    let both = ["toolrank", "articles", "ingest", "--file", "--text", "a.md"];
    assert!(Cli::try_parse_from(both).is_err());
    // --mime-type only applies to files.
    let mime_only = ["toolrank", "articles", "ingest", "--mime-type", "text/plain", "x"];
    assert!(Cli::try_parse_from(mime_only).is_err());
}

#[test]
fn articles_ingest_requires_input() {
    assert!(Cli::try_parse_from(["toolrank", "articles", "ingest"]).is_err());
}

#[test]
fn articles_list_defaults_to_active() {
    let cli = Cli::try_parse_from(["toolrank", "articles", "list", "--tag", "agents"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Articles {
            command: ArticlesCommands::List {
                status: ArticleStatus::Active,
                tag: Some(ref t),
                limit: 50,
                offset: 0,
                ..
            }
        }) if t == "agents"
    ));
}

#[test]
fn articles_update_splits_tags() {
    let id = uuid::Uuid::new_v4().to_string();
    let cli = Cli::try_parse_from([
        "toolrank",
        "articles",
        "update",
        id.as_str(),
        "--tags",
        "agents,ide",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Articles {
            command: ArticlesCommands::Update { tags: Some(ref tags), .. }
        }) if tags == &["agents", "ide"]
    ));
}

#[test]
fn articles_delete_hard_flag() {
    let id = uuid::Uuid::new_v4().to_string();
    let cli =
        Cli::try_parse_from(["toolrank", "articles", "delete", id.as_str(), "--hard"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Articles {
            command: ArticlesCommands::Delete { hard: true, .. }
        })
    ));
}

#[test]
fn ledger_and_versions_commands() {
    let id = uuid::Uuid::new_v4().to_string();
    let cli = Cli::try_parse_from(["toolrank", "ledger", "rollback", id.as_str()]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ledger {
            command: LedgerCommands::Rollback { .. }
        })
    ));

    let cli = Cli::try_parse_from(["toolrank", "ledger", "recent"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Ledger {
            command: LedgerCommands::Recent { limit: 20 }
        })
    ));

    let cli =
        Cli::try_parse_from(["toolrank", "versions", "create", "--summary", "weekly"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Versions {
            command: VersionsCommands::Create {
                summary: Some(ref s),
                article: None,
                ref created_by,
            }
        }) if s == "weekly" && created_by == "admin"
    ));
}

#[test]
fn parses_schedule() {
    let cli = Cli::try_parse_from(["toolrank", "schedule"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Schedule)));
}

#[tokio::test]
async fn unconfigured_model_reports_missing_key() {
    let err = UnconfiguredModel
        .generate(
            &[Message::user("hello")],
            GenerationParams {
                temperature: 0.0,
                max_tokens: 10,
            },
            RetryPolicy::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::NotConfigured(_)));
    assert!(!err.is_retriable());
}
