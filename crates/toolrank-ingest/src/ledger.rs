//! Reversible per-article ranking deltas and full-state ranking versions.
//!
//! Every committed change belongs to one article. Rolling an article back
//! flips the `rolled_back` flag on its applied rows and leaves other articles'
//! rows untouched. Versions are immutable snapshots of the whole ranking.

use std::sync::Arc;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use toolrank_core::ChangeType;
use toolrank_db::{NewRankingChange, NewRankingVersion, RankingChangeRow, RankingVersionRow, Store};
use uuid::Uuid;

use crate::error::IngestError;
use crate::impact::PredictedChange;

const FIRST_VERSION: &str = "1.0.0";
const UNKNOWN_TOOL_ID: &str = "unknown";
const UNKNOWN_TOOL_NAME: &str = "Unknown Tool";

/// A change to commit. Unset fields take the ledger defaults.
#[derive(Debug, Clone, Default)]
pub struct ChangeRecord {
    pub article_id: Uuid,
    pub tool_id: Option<String>,
    pub tool_name: Option<String>,
    pub article_url: Option<String>,
    pub metric_changes: Option<serde_json::Value>,
    pub old_rank: Option<i32>,
    pub new_rank: Option<i32>,
    pub rank_change: i32,
    pub old_score: Option<f64>,
    pub new_score: Option<f64>,
    pub score_change: Option<f64>,
    pub change_type: Option<ChangeType>,
    pub change_reason: Option<String>,
    pub is_applied: Option<bool>,
}

impl ChangeRecord {
    /// Build a record from a calculator prediction. The change type follows
    /// the sign of the score delta.
    #[must_use]
    pub fn from_prediction(
        article_id: Uuid,
        article_url: Option<String>,
        predicted: &PredictedChange,
        reason: &str,
    ) -> Self {
        Self {
            article_id,
            tool_id: Some(predicted.tool_id.clone()),
            tool_name: Some(predicted.tool_name.clone()),
            article_url,
            metric_changes: serde_json::to_value(predicted.metrics).ok(),
            old_rank: Some(predicted.current_rank),
            new_rank: Some(predicted.predicted_rank),
            rank_change: predicted.rank_change,
            old_score: Some(predicted.current_score),
            new_score: Some(predicted.predicted_score),
            score_change: Some(predicted.score_change),
            change_type: Some(ChangeType::from_score_change(predicted.score_change)),
            change_reason: Some(reason.to_owned()),
            is_applied: Some(true),
        }
    }

    fn into_new_change(self) -> NewRankingChange {
        NewRankingChange {
            article_id: self.article_id,
            tool_id: self.tool_id.unwrap_or_else(|| UNKNOWN_TOOL_ID.to_owned()),
            tool_name: self.tool_name.unwrap_or_else(|| UNKNOWN_TOOL_NAME.to_owned()),
            article_url: self.article_url,
            metric_changes: self
                .metric_changes
                .unwrap_or_else(|| serde_json::json!({})),
            old_rank: self.old_rank,
            new_rank: self.new_rank,
            rank_change: self.rank_change,
            old_score: to_decimal(self.old_score.unwrap_or(0.0)),
            new_score: to_decimal(self.new_score.unwrap_or(0.0)),
            score_change: to_decimal(self.score_change.unwrap_or(0.0)),
            change_type: self.change_type.unwrap_or(ChangeType::NoChange),
            change_reason: self.change_reason.unwrap_or_default(),
            is_applied: self.is_applied.unwrap_or(true),
        }
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(4)
}

/// Aggregate effect of one article's live (not rolled back) changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleImpact {
    pub tools_affected: usize,
    pub average_rank_change: f64,
    pub average_score_change: f64,
    pub improved: usize,
    pub declined: usize,
    pub new_entries: usize,
}

/// Inputs for a new ranking version. The label and previous pointer are
/// derived from the latest stored version.
#[derive(Debug, Clone)]
pub struct VersionRequest {
    pub article_id: Option<Uuid>,
    pub changes_summary: Option<String>,
    pub news_items_count: i32,
    pub tools_affected: i32,
    pub created_by: String,
    pub is_rollback: bool,
    pub rolled_back_from_id: Option<Uuid>,
}

impl Default for VersionRequest {
    fn default() -> Self {
        Self {
            article_id: None,
            changes_summary: None,
            news_items_count: 0,
            tools_affected: 0,
            created_by: "system".to_owned(),
            is_rollback: false,
            rolled_back_from_id: None,
        }
    }
}

pub struct RankingChangeLedger {
    store: Arc<dyn Store>,
}

impl RankingChangeLedger {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Store `changes` as one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] if the batch cannot be stored; in
    /// that case nothing is stored.
    pub async fn commit(
        &self,
        changes: Vec<ChangeRecord>,
    ) -> Result<Vec<RankingChangeRow>, IngestError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let batch: Vec<NewRankingChange> = changes
            .into_iter()
            .map(ChangeRecord::into_new_change)
            .collect();
        let rows = self.store.insert_ranking_changes(&batch).await?;
        tracing::info!(count = rows.len(), "committed ranking changes");
        Ok(rows)
    }

    /// Mark every applied, not yet rolled back change for the article as
    /// rolled back. Returns how many rows changed; a second call returns 0.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn rollback(&self, article_id: Uuid) -> Result<u64, IngestError> {
        let count = self.store.rollback_ranking_changes(article_id).await?;
        tracing::info!(article_id = %article_id, count, "rolled back ranking changes");
        Ok(count)
    }

    /// All changes for the article, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn changes_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<RankingChangeRow>, IngestError> {
        Ok(self.store.ranking_changes_for_article(article_id).await?)
    }

    /// Latest applied changes across all articles.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn recent_changes(&self, limit: i64) -> Result<Vec<RankingChangeRow>, IngestError> {
        Ok(self.store.recent_ranking_changes(limit).await?)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn impact(&self, article_id: Uuid) -> Result<ArticleImpact, IngestError> {
        let changes = self.store.ranking_changes_for_article(article_id).await?;
        Ok(summarize_impact(&changes))
    }

    /// Snapshot the current ranking as the next version.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] if the latest version label is not
    /// `major.minor.patch`, and [`IngestError::Persistence`] on store failure.
    pub async fn create_version(
        &self,
        request: VersionRequest,
    ) -> Result<RankingVersionRow, IngestError> {
        let latest = self.store.latest_ranking_version().await?;
        let version = match &latest {
            Some(prev) => next_version(&prev.version)?,
            None => FIRST_VERSION.to_owned(),
        };
        let rankings = self.store.current_rankings().await?;
        let snapshot = serde_json::to_value(&rankings)
            .map_err(|e| IngestError::Validation(format!("rankings snapshot: {e}")))?;

        let row = self
            .store
            .create_ranking_version(&NewRankingVersion {
                version,
                article_id: request.article_id,
                rankings_snapshot: snapshot,
                changes_summary: request.changes_summary,
                news_items_count: request.news_items_count,
                tools_affected: request.tools_affected,
                previous_version_id: latest.map(|v| v.id),
                created_by: request.created_by,
                is_rollback: request.is_rollback,
                rolled_back_from_id: request.rolled_back_from_id,
            })
            .await?;
        tracing::info!(version = %row.version, tools = rankings.len(), "created ranking version");
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn list_versions(&self, limit: i64) -> Result<Vec<RankingVersionRow>, IngestError> {
        Ok(self.store.list_ranking_versions(limit).await?)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn latest_version(&self) -> Result<Option<RankingVersionRow>, IngestError> {
        Ok(self.store.latest_ranking_version().await?)
    }
}

/// Increment the patch component: `1.0.9` → `1.0.10`.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] if `label` is not three dot-separated
/// integers.
pub fn next_version(label: &str) -> Result<String, IngestError> {
    let parts: Vec<u64> = label
        .split('.')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| IngestError::Validation(format!("unparseable version label: {label}")))?;
    match parts.as_slice() {
        [major, minor, patch] => Ok(format!("{major}.{minor}.{}", patch + 1)),
        _ => Err(IngestError::Validation(format!(
            "unparseable version label: {label}"
        ))),
    }
}

fn summarize_impact(changes: &[RankingChangeRow]) -> ArticleImpact {
    let live: Vec<&RankingChangeRow> = changes.iter().filter(|c| !c.rolled_back).collect();
    if live.is_empty() {
        return ArticleImpact::default();
    }
    #[allow(clippy::cast_precision_loss)]
    let n = live.len() as f64;
    let score_total: f64 = live
        .iter()
        .map(|c| c.score_change.to_f64().unwrap_or(0.0))
        .sum();
    let count_type =
        |kind: ChangeType| live.iter().filter(|c| c.change_type == kind.as_str()).count();

    ArticleImpact {
        tools_affected: live.len(),
        average_rank_change: live.iter().map(|c| f64::from(c.rank_change)).sum::<f64>() / n,
        average_score_change: score_total / n,
        improved: count_type(ChangeType::Increase),
        declined: count_type(ChangeType::Decrease),
        new_entries: count_type(ChangeType::NewEntry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_labels_increment_patch() {
        assert_eq!(next_version("1.0.0").unwrap(), "1.0.1");
        assert_eq!(next_version("2.3.9").unwrap(), "2.3.10");
    }

    #[test]
    fn malformed_version_label_is_rejected() {
        assert!(matches!(next_version("v1"), Err(IngestError::Validation(_))));
        assert!(matches!(next_version("1.0"), Err(IngestError::Validation(_))));
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let change = ChangeRecord {
            article_id: Uuid::nil(),
            ..ChangeRecord::default()
        }
        .into_new_change();
        assert_eq!(change.tool_id, "unknown");
        assert_eq!(change.tool_name, "Unknown Tool");
        assert_eq!(change.change_type, ChangeType::NoChange);
        assert_eq!(change.score_change, Decimal::ZERO);
        assert!(change.is_applied);
        assert!(change.change_reason.is_empty());
    }
}
