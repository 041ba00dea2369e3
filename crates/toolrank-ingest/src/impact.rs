//! Deterministic ranking-impact scoring.
//!
//! Converts an [`AnalysisResult`] and the current ranking into predicted
//! per-tool deltas. Everything here is pure; no I/O and no clock.
//!
//! Per tool mention:
//!
//! ```text
//! points  = relevance × 3 × sentiment × (0.5 + importance / 20)
//!         + Σ matching keyword rules        (sign-gated, see IMPACT_RULES)
//! points  = clamp(points, -10, 10)
//! score'  = clamp(score + points / 100, 0, 1)
//! rank Δ  = 0                               if |points| < 0.5
//!         = ∓max(1, round(|points| / 2))    otherwise
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use toolrank_core::{AnalysisResult, KnownCompany, KnownTool, ToolMention, ToolRanking};

use crate::normalizer::normalize;

const MAX_POINTS: f64 = 10.0;
const RANK_CHANGE_THRESHOLD: f64 = 0.5;
const POINTS_PER_RANK: f64 = 2.0;

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
    /// Applies only when the mention's sentiment is above zero.
    Positive,
    /// Applies only when the mention's sentiment is below zero.
    Negative,
}

/// A context keyword group and the points it adds when any keyword matches.
#[derive(Debug)]
struct ImpactRule {
    polarity: Polarity,
    keywords: &'static [&'static str],
    points: f64,
}

const IMPACT_RULES: &[ImpactRule] = &[
    ImpactRule {
        polarity: Polarity::Positive,
        keywords: &["launch", "release", "announces"],
        points: 2.0,
    },
    ImpactRule {
        polarity: Polarity::Positive,
        keywords: &["partnership", "acquisition"],
        points: 1.5,
    },
    ImpactRule {
        polarity: Polarity::Positive,
        keywords: &["breakthrough", "revolutionary"],
        points: 2.5,
    },
    ImpactRule {
        polarity: Polarity::Negative,
        keywords: &["breach", "hack", "vulnerability"],
        points: -3.0,
    },
    ImpactRule {
        polarity: Polarity::Negative,
        keywords: &["lawsuit", "sued", "litigation"],
        points: -2.0,
    },
    ImpactRule {
        polarity: Polarity::Negative,
        keywords: &["shutdown", "discontinued", "cancelled"],
        points: -5.0,
    },
    ImpactRule {
        polarity: Polarity::Negative,
        keywords: &["layoff", "downsizing"],
        points: -1.5,
    },
];

/// `(minimum amount in millions, points)`, checked in order.
const FUNDING_TIERS: &[(u64, f64)] = &[(400, 4.0), (200, 3.0), (100, 2.0), (50, 1.5)];
const SMALL_FUNDING_POINTS: f64 = 0.5;

static FUNDING_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)([mb])").expect("valid regex"));

/// `(category, keywords)` for newly discovered tools, checked in order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("code-assistant", &["copilot", "codewhisperer", "tabnine", "kite"]),
    ("llm", &["gpt", "claude", "gemini", "llama", "mistral"]),
    (
        "image-generation",
        &["dall-e", "midjourney", "stable diffusion", "imagen"],
    ),
    ("chat", &["chatgpt", "bard", "perplexity", "character.ai"]),
    ("autonomous-agent", &["devin", "cursor", "aider", "sweep"]),
];
const FALLBACK_CATEGORY: &str = "other";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub old: f64,
    pub new: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeMetrics {
    pub sentiment: MetricDelta,
    pub relevance: MetricDelta,
}

/// One tool's predicted movement. Scores are on the 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedChange {
    pub tool_id: String,
    pub tool_name: String,
    pub current_rank: i32,
    pub predicted_rank: i32,
    /// Negative means the tool moves up.
    pub rank_change: i32,
    pub current_score: f64,
    pub predicted_score: f64,
    /// Clamped impact points; equals the score delta on the 0–100 scale
    /// unless the score hit a bound.
    pub score_change: f64,
    pub metrics: ChangeMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToolCandidate {
    pub name: String,
    pub category: String,
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompanyCandidate {
    pub name: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntities {
    pub tools: Vec<NewToolCandidate>,
    pub companies: Vec<NewCompanyCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total_tools_affected: usize,
    pub total_new_tools: usize,
    pub total_new_companies: usize,
    pub average_rank_change: f64,
    pub average_score_change: f64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Predicted changes for every mention whose tool is in `rankings`.
/// Mentions of unranked tools are skipped.
#[must_use]
pub fn calculate_changes(
    analysis: &AnalysisResult,
    rankings: &[ToolRanking],
) -> Vec<PredictedChange> {
    let mut changes = Vec::new();
    for mention in &analysis.tool_mentions {
        let canonical = normalize(&mention.tool);
        let Some(current) = rankings
            .iter()
            .find(|r| r.tool_name == canonical || r.tool_name == mention.tool)
        else {
            tracing::debug!(tool = %canonical, "tool not in current ranking, skipping");
            continue;
        };

        let points = impact_points(mention, analysis.importance_score);
        let current_score = current.normalized_score();
        let predicted_score = (current_score + points / 100.0).clamp(0.0, 1.0);
        let rank_change = rank_change_for(points);

        changes.push(PredictedChange {
            tool_id: current.tool_id.clone(),
            tool_name: canonical,
            current_rank: current.rank,
            predicted_rank: (current.rank + rank_change).max(1),
            rank_change,
            current_score: current_score * 100.0,
            predicted_score: predicted_score * 100.0,
            score_change: points,
            metrics: ChangeMetrics {
                sentiment: MetricDelta {
                    old: 0.0,
                    new: mention.sentiment,
                    change: mention.sentiment,
                },
                relevance: MetricDelta {
                    old: 0.0,
                    new: mention.relevance,
                    change: mention.relevance,
                },
            },
        });
    }
    changes
}

/// Clamped impact points for one mention.
#[must_use]
pub fn impact_points(mention: &ToolMention, importance: f64) -> f64 {
    let base = mention.relevance * 3.0 * mention.sentiment * (0.5 + importance / 20.0);
    let context = mention.context.to_lowercase();

    let polarity = if mention.sentiment > 0.0 {
        Some(Polarity::Positive)
    } else if mention.sentiment < 0.0 {
        Some(Polarity::Negative)
    } else {
        None
    };

    let mut points = base;
    if let Some(polarity) = polarity {
        if polarity == Polarity::Positive {
            points += funding_points(&context).unwrap_or(0.0);
        }
        points += IMPACT_RULES
            .iter()
            .filter(|rule| rule.polarity == polarity)
            .filter(|rule| rule.keywords.iter().any(|kw| context.contains(kw)))
            .map(|rule| rule.points)
            .sum::<f64>();
    }

    points.clamp(-MAX_POINTS, MAX_POINTS)
}

/// Bonus for a funding mention with a parseable `$NNN[m|b]` amount.
fn funding_points(context_lower: &str) -> Option<f64> {
    if !context_lower.contains("funding") {
        return None;
    }
    let caps = FUNDING_AMOUNT_RE.captures(context_lower)?;
    let amount: u64 = caps.get(1)?.as_str().parse().ok()?;
    let millions = if caps.get(2)?.as_str() == "b" {
        amount.saturating_mul(1000)
    } else {
        amount
    };
    Some(
        FUNDING_TIERS
            .iter()
            .find(|(min, _)| millions >= *min)
            .map_or(SMALL_FUNDING_POINTS, |(_, pts)| *pts),
    )
}

fn rank_change_for(points: f64) -> i32 {
    if points.abs() < RANK_CHANGE_THRESHOLD {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let steps = ((points.abs() / POINTS_PER_RANK).round() as i32).max(1);
    if points > 0.0 {
        -steps
    } else {
        steps
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Tools and companies mentioned by `analysis` that the catalog does not
/// know yet, each listed once.
#[must_use]
pub fn identify_new_entities(
    analysis: &AnalysisResult,
    known_tools: &[KnownTool],
    known_companies: &[KnownCompany],
) -> NewEntities {
    let tool_names: HashSet<&str> = known_tools.iter().map(|t| t.name.as_str()).collect();
    let company_names: HashSet<&str> = known_companies.iter().map(|c| c.name.as_str()).collect();

    let mut entities = NewEntities::default();
    let mut seen_tools = HashSet::new();
    for mention in &analysis.tool_mentions {
        let canonical = normalize(&mention.tool);
        if tool_names.contains(canonical.as_str()) || tool_names.contains(mention.tool.as_str()) {
            continue;
        }
        if !seen_tools.insert(mention.tool.clone()) {
            continue;
        }
        entities.tools.push(NewToolCandidate {
            name: mention.tool.clone(),
            category: infer_category(&mention.tool, &mention.context).to_owned(),
            company_id: None,
        });
    }

    let mut seen_companies = HashSet::new();
    for mention in &analysis.company_mentions {
        if company_names.contains(mention.company.as_str())
            || !seen_companies.insert(mention.company.clone())
        {
            continue;
        }
        entities.companies.push(NewCompanyCandidate {
            name: mention.company.clone(),
            website: None,
        });
    }
    entities
}

/// First category whose keywords appear in the tool name or context.
#[must_use]
pub fn infer_category(tool_name: &str, context: &str) -> &'static str {
    let name = tool_name.to_lowercase();
    let context = context.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| name.contains(kw) || context.contains(kw))
        })
        .map_or(FALLBACK_CATEGORY, |(category, _)| category)
}

/// Totals and averages for a dry-run report. Averages are 0 with no changes.
#[must_use]
pub fn summarize(changes: &[PredictedChange], entities: &NewEntities) -> ChangeSummary {
    #[allow(clippy::cast_precision_loss)]
    let denom = changes.len().max(1) as f64;
    ChangeSummary {
        total_tools_affected: changes.len(),
        total_new_tools: entities.tools.len(),
        total_new_companies: entities.companies.len(),
        average_rank_change: changes.iter().map(|c| f64::from(c.rank_change)).sum::<f64>() / denom,
        average_score_change: changes.iter().map(|c| c.score_change).sum::<f64>() / denom,
    }
}

#[cfg(test)]
#[path = "impact_test.rs"]
mod tests;
