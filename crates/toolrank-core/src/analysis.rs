//! Structured extraction produced by the content analyzer.
//!
//! Optional fields accept JSON `null` as absent. Range checks on the numeric
//! fields are done by the analyzer, not by deserialization.

use serde::{Deserialize, Serialize};

/// One tool referenced by an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMention {
    /// Tool name. Canonical after normalization.
    pub tool: String,
    /// Sentence or phrase the tool appears in.
    pub context: String,
    /// Sentiment toward the tool, in `[-1.0, 1.0]`.
    pub sentiment: f64,
    /// How central the tool is to the article, in `[0.0, 1.0]`.
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMention {
    pub company: String,
    pub context: String,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingImpacts {
    #[serde(default)]
    pub likely_winners: Vec<String>,
    #[serde(default)]
    pub likely_losers: Vec<String>,
    #[serde(default)]
    pub emerging_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub rewritten_excerpt: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub tool_mentions: Vec<ToolMention>,
    pub company_mentions: Vec<CompanyMention>,
    /// Overall article sentiment, in `[-1.0, 1.0]`.
    pub overall_sentiment: f64,
    /// Article importance, in `[0.0, 10.0]`.
    pub importance_score: f64,
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub ranking_impacts: Option<RankingImpacts>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_optional_fields_deserialize_as_none() {
        let json = serde_json::json!({
            "title": "Cursor ships agent mode",
            "summary": "Cursor adds an autonomous agent.",
            "source": null,
            "url": null,
            "published_date": null,
            "category": null,
            "tags": ["agents"],
            "tool_mentions": [],
            "company_mentions": [{"company": "Anysphere", "context": "maker", "tools": null}],
            "overall_sentiment": 0.4,
            "importance_score": 6,
            "key_insights": [],
            "ranking_impacts": null
        });

        let parsed: AnalysisResult = serde_json::from_value(json).unwrap();
        assert!(parsed.source.is_none());
        assert!(parsed.url.is_none());
        assert!(parsed.ranking_impacts.is_none());
        assert!(parsed.company_mentions[0].tools.is_none());
        assert!((parsed.importance_score - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = serde_json::json!({
            "title": "No summary",
            "tags": [],
            "tool_mentions": [],
            "company_mentions": [],
            "overall_sentiment": 0.0,
            "importance_score": 5,
            "key_insights": []
        });

        assert!(serde_json::from_value::<AnalysisResult>(json).is_err());
    }
}
