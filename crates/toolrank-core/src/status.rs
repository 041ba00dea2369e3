//! Lifecycle enums and their persisted string forms.
//!
//! Each enum is stored as `TEXT` in Postgres. `as_str` gives the persisted
//! value and `FromStr` parses it back.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Lifecycle of a stored article. Only `Active` articles are visible to reads.
    ArticleStatus, "article status" {
        Draft => "draft",
        Active => "active",
        Archived => "archived",
        Deleted => "deleted",
    }
}

string_enum! {
    /// How the article body entered the system.
    IngestionType, "ingestion type" {
        Url => "url",
        Text => "text",
        File => "file",
    }
}

string_enum! {
    /// Direction of a single ledger entry.
    ChangeType, "change type" {
        Increase => "increase",
        Decrease => "decrease",
        NewEntry => "new_entry",
        NoChange => "no_change",
    }
}

string_enum! {
    ProcessingAction, "processing action" {
        DryRun => "dry_run",
        Ingest => "ingest",
        Update => "update",
        Recalculate => "recalculate",
        Delete => "delete",
        Rollback => "rollback",
    }
}

string_enum! {
    ProcessingStatus, "processing status" {
        Started => "started",
        Completed => "completed",
        Failed => "failed",
    }
}

string_enum! {
    /// Final or in-flight state of an ingestion run.
    ///
    /// `PartiallyFailed` is reported to callers but persisted as `completed`
    /// with a non-empty error log; see [`RunStatus::persisted`].
    RunStatus, "run status" {
        Running => "running",
        Completed => "completed",
        PartiallyFailed => "partially_failed",
        Failed => "failed",
    }
}

string_enum! {
    RunType, "run type" {
        DailyNews => "daily_news",
        MonthlySummary => "monthly_summary",
        Manual => "manual",
    }
}

impl RunStatus {
    /// The status written to the `ingestion_runs.status` column.
    #[must_use]
    pub fn persisted(self) -> RunStatus {
        match self {
            RunStatus::PartiallyFailed => RunStatus::Completed,
            other => other,
        }
    }
}

impl ChangeType {
    /// Classify a ledger entry by the sign of its score delta.
    #[must_use]
    pub fn from_score_change(score_change: f64) -> ChangeType {
        if score_change > 0.0 {
            ChangeType::Increase
        } else if score_change < 0.0 {
            ChangeType::Decrease
        } else {
            ChangeType::NoChange
        }
    }
}

impl IngestionType {
    /// Parse a caller-supplied ingestion type, falling back to `Text` for
    /// anything unrecognized.
    #[must_use]
    pub fn parse_or_text(value: &str) -> IngestionType {
        value.parse().unwrap_or(IngestionType::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_round_trips_through_str() {
        for status in [
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::PartiallyFailed,
            RunStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<RunStatus>(), Ok(status));
        }
    }

    #[test]
    fn partially_failed_persists_as_completed() {
        assert_eq!(RunStatus::PartiallyFailed.persisted(), RunStatus::Completed);
        assert_eq!(RunStatus::Failed.persisted(), RunStatus::Failed);
    }

    #[test]
    fn unknown_value_reports_kind() {
        let err = "paused".parse::<ArticleStatus>().unwrap_err();
        assert_eq!(err.kind, "article status");
        assert_eq!(err.value, "paused");
    }

    #[test]
    fn change_type_follows_score_sign() {
        assert_eq!(ChangeType::from_score_change(0.02), ChangeType::Increase);
        assert_eq!(ChangeType::from_score_change(-0.01), ChangeType::Decrease);
        assert_eq!(ChangeType::from_score_change(0.0), ChangeType::NoChange);
    }

    #[test]
    fn ingestion_type_defaults_to_text() {
        assert_eq!(IngestionType::parse_or_text("url"), IngestionType::Url);
        assert_eq!(IngestionType::parse_or_text("pdf"), IngestionType::Text);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ProcessingAction::DryRun).unwrap();
        assert_eq!(json, "\"dry_run\"");
    }
}
