//! LLM-gated article quality assessment.
//!
//! The gate never fails: any language-model or parsing error yields a
//! reject-by-default assessment wrapped in [`AssessmentOutcome::Degraded`] so
//! callers can tell a confident rejection from a fallback.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use toolrank_llm::{strip_code_fence, GenerationParams, LanguageModel, Message, RetryPolicy};

use crate::error::IngestError;

/// Default minimum average of the three scores.
pub const DEFAULT_MIN_AVERAGE: f64 = 7.0;
/// Relevance below this is rejected regardless of the average.
pub const MIN_RELEVANCE: f64 = 7.0;
const NEUTRAL_SCORE: f64 = 5.0;
const MAX_PROMPT_CONTENT_CHARS: usize = 4_000;

const SYSTEM_PROMPT: &str = r#"You are an expert content evaluator for an AI coding tool ranking site that tracks AI coding tools and their capabilities.

Evaluate articles for:
1. **Quality** (0-10): Writing quality, depth, accuracy, citations
2. **Relevance** (0-10): How relevant to AI coding tools, LLMs, developer tools
3. **Credibility** (0-10): Source reputation, author expertise, factual accuracy

Respond ONLY with valid JSON in this exact format:
{
  "qualityScore": <number 0-10>,
  "relevanceScore": <number 0-10>,
  "credibilityScore": <number 0-10>,
  "reasoning": "<brief explanation>",
  "suggestedCategories": ["<category1>", "<category2>"]
}

Categories to choose from: AI Assistants, Code Generation, IDE Integration, Testing Tools, Documentation, DevOps, Security, Performance, General AI News"#;

/// An article as seen by the gate.
#[derive(Debug, Clone)]
pub struct ArticleToAssess {
    pub title: String,
    pub content: String,
    pub source: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityAssessment {
    pub quality_score: f64,
    pub relevance_score: f64,
    pub credibility_score: f64,
    pub reasoning: String,
    pub suggested_categories: Vec<String>,
    pub should_ingest: bool,
    /// USD spent on the language-model call.
    pub estimated_cost: f64,
}

impl QualityAssessment {
    fn rejected(estimated_cost: f64) -> Self {
        Self {
            quality_score: NEUTRAL_SCORE,
            relevance_score: NEUTRAL_SCORE,
            credibility_score: NEUTRAL_SCORE,
            reasoning: "Assessment failed - using default scores".to_owned(),
            suggested_categories: Vec::new(),
            should_ingest: false,
            estimated_cost,
        }
    }

    #[must_use]
    pub fn average(&self) -> f64 {
        (self.quality_score + self.relevance_score + self.credibility_score) / 3.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentOutcome {
    /// The model answered and the answer parsed.
    Ok(QualityAssessment),
    /// The model call or parse failed; `assessment` is the reject default.
    Degraded {
        assessment: QualityAssessment,
        reason: String,
    },
}

impl AssessmentOutcome {
    #[must_use]
    pub fn assessment(&self) -> &QualityAssessment {
        match self {
            AssessmentOutcome::Ok(a) | AssessmentOutcome::Degraded { assessment: a, .. } => a,
        }
    }

    #[must_use]
    pub fn should_ingest(&self) -> bool {
        self.assessment().should_ingest
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, AssessmentOutcome::Degraded { .. })
    }
}

pub struct QualityGate {
    llm: Arc<dyn LanguageModel>,
    min_average: f64,
    policy: RetryPolicy,
}

impl QualityGate {
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            min_average: DEFAULT_MIN_AVERAGE,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_min_average(mut self, min_average: f64) -> Self {
        self.min_average = min_average;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn min_average(&self) -> f64 {
        self.min_average
    }

    pub async fn assess(&self, article: &ArticleToAssess) -> AssessmentOutcome {
        self.assess_with(article, self.min_average).await
    }

    /// Like [`QualityGate::assess`] with a one-off average threshold.
    pub async fn assess_with(
        &self,
        article: &ArticleToAssess,
        min_average: f64,
    ) -> AssessmentOutcome {
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(article)),
        ];
        let params = GenerationParams {
            temperature: 0.3,
            max_tokens: 1000,
        };
        let title: String = article.title.chars().take(50).collect();

        let generation = match self.llm.generate(&messages, params, self.policy).await {
            Ok(g) => g,
            Err(err) => {
                tracing::error!(
                    title = %title,
                    source = %article.source,
                    error = %err,
                    "article quality assessment failed"
                );
                return AssessmentOutcome::Degraded {
                    assessment: QualityAssessment::rejected(0.0),
                    reason: err.to_string(),
                };
            }
        };

        let cost = generation.metadata.estimated_cost;
        match parse_assessment(&generation.content, min_average, cost) {
            Ok(assessment) => {
                tracing::info!(
                    title = %title,
                    source = %article.source,
                    quality = assessment.quality_score,
                    relevance = assessment.relevance_score,
                    credibility = assessment.credibility_score,
                    should_ingest = assessment.should_ingest,
                    cost = format!("{cost:.4}"),
                    "article quality assessment completed"
                );
                AssessmentOutcome::Ok(assessment)
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(
                    title = %title,
                    error = %reason,
                    preview = %generation.content.chars().take(200).collect::<String>(),
                    "failed to parse quality assessment response"
                );
                AssessmentOutcome::Degraded {
                    assessment: QualityAssessment::rejected(cost),
                    reason,
                }
            }
        }
    }

    /// Assess `articles` one at a time, preserving order.
    pub async fn batch_assess(&self, articles: &[ArticleToAssess]) -> Vec<AssessmentOutcome> {
        self.batch_assess_with(articles, self.min_average).await
    }

    pub async fn batch_assess_with(
        &self,
        articles: &[ArticleToAssess],
        min_average: f64,
    ) -> Vec<AssessmentOutcome> {
        let mut outcomes = Vec::with_capacity(articles.len());
        for article in articles {
            outcomes.push(self.assess_with(article, min_average).await);
        }

        let accepted = outcomes.iter().filter(|o| o.should_ingest()).count();
        let total_cost: f64 = outcomes.iter().map(|o| o.assessment().estimated_cost).sum();
        tracing::info!(
            total = articles.len(),
            accepted,
            rejected = articles.len() - accepted,
            degraded = outcomes.iter().filter(|o| o.is_degraded()).count(),
            total_cost = format!("{total_cost:.4}"),
            "batch article assessment completed"
        );
        outcomes
    }
}

fn build_user_prompt(article: &ArticleToAssess) -> String {
    let mut prompt = format!(
        "Evaluate this article:\n\nTitle: {}\nSource: {}\n",
        article.title, article.source
    );
    if let Some(url) = &article.url {
        let _ = writeln!(prompt, "URL: {url}");
    }
    if let Some(published) = article.published_at {
        let _ = writeln!(prompt, "Published: {}", published.date_naive());
    }
    prompt.push_str("\nContent:\n");
    prompt.extend(article.content.chars().take(MAX_PROMPT_CONTENT_CHARS));
    if article.content.chars().count() > MAX_PROMPT_CONTENT_CHARS {
        prompt.push_str("\n[Content truncated...]");
    }
    prompt
}

/// Parse a model response into an assessment.
///
/// Scores are clamped to `[0, 10]`; a missing, non-numeric, or non-finite
/// score counts as 5.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] when the response is not a JSON object.
pub fn parse_assessment(
    content: &str,
    min_average: f64,
    estimated_cost: f64,
) -> Result<QualityAssessment, IngestError> {
    let value: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| IngestError::Validation(format!("assessment is not JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(IngestError::Validation(
            "assessment is not a JSON object".to_owned(),
        ));
    };

    let quality_score = clamp_score(fields.get("qualityScore"));
    let relevance_score = clamp_score(fields.get("relevanceScore"));
    let credibility_score = clamp_score(fields.get("credibilityScore"));
    let average = (quality_score + relevance_score + credibility_score) / 3.0;

    let reasoning = fields
        .get("reasoning")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("No reasoning provided")
        .to_owned();
    let suggested_categories = fields
        .get("suggestedCategories")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Ok(QualityAssessment {
        quality_score,
        relevance_score,
        credibility_score,
        reasoning,
        suggested_categories,
        should_ingest: average >= min_average && relevance_score >= MIN_RELEVANCE,
        estimated_cost,
    })
}

fn clamp_score(value: Option<&Value>) -> f64 {
    match value.and_then(Value::as_f64) {
        Some(score) if score.is_finite() => score.clamp(0.0, 10.0),
        _ => NEUTRAL_SCORE,
    }
}
