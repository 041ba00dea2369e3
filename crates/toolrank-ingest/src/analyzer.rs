//! Structured extraction of tool and company signal from article text.

use std::fmt::Write as _;
use std::sync::Arc;

use toolrank_core::AnalysisResult;
use toolrank_llm::{strip_code_fence, GenerationParams, LanguageModel, Message, RetryPolicy};

use crate::error::IngestError;
use crate::normalizer::normalize_mentions;

const MAX_PROMPT_CONTENT_CHARS: usize = 10_000;

const SYSTEM_PROMPT: &str = r#"You are an expert AI industry analyst specializing in AI tools, technologies, and market trends.
Your task is to analyze articles and extract structured information about AI tools, companies, and their potential impact on rankings.

Focus on:
1. Identifying ALL AI tools, models, and services mentioned - USE SPECIFIC PRODUCT NAMES when possible:
   - For OpenAI: "ChatGPT Canvas" for their code editor, "GPT-4" for the model, "OpenAI Codex CLI" for Codex
   - For Anthropic: "Claude Code" for their coding tool, "Claude 3.5" for the model, "Claude Artifacts" for UI generation
   - For Google: "Google Gemini Code Assist" for code assistance, "Google Jules" for their agent, "Gemini" for the model
   - For GitHub/Microsoft: "GitHub Copilot" (not just "Copilot"), "Microsoft IntelliCode"
   - For Amazon: "Amazon Q Developer" (evolved from CodeWhisperer)
   - For specific products: "Replit Agent", "Devin", "Cursor", "Windsurf", "v0", "Aider", etc.
   - When unsure, use the most specific name mentioned in the article
2. Understanding the context and sentiment around each tool
3. Identifying companies behind the tools
4. Predicting potential ranking impacts based on the news
5. Extracting key insights and trends

Be thorough and precise. Extract the exact tool names as mentioned, we'll handle normalization.

IMPORTANT: You MUST return ONLY a valid JSON object. Do not include any explanatory text before or after the JSON."#;

const RESPONSE_SHAPE: &str = r#"Return a detailed JSON analysis with this structure:
{
  "title": "Article title",
  "summary": "2-3 sentence summary",
  "source": "Publication or domain",
  "url": "Source URL if available",
  "published_date": "YYYY-MM-DD format",
  "category": "AI category (e.g., 'LLM', 'Code Assistant', 'Image Generation')",
  "tags": ["relevant", "tags", "for", "article"],
  "tool_mentions": [
    {
      "tool": "Tool name as mentioned",
      "context": "How the tool is mentioned",
      "sentiment": 0.8,
      "relevance": 0.9
    }
  ],
  "company_mentions": [
    {
      "company": "Company name",
      "context": "How the company is mentioned",
      "tools": ["tools owned by this company"]
    }
  ],
  "overall_sentiment": 0.7,
  "importance_score": 8,
  "key_insights": ["Major insight or trend from the article"],
  "ranking_impacts": {
    "likely_winners": ["Tools likely to gain in rankings"],
    "likely_losers": ["Tools likely to drop"],
    "emerging_tools": ["New or emerging tools mentioned"]
  }
}

sentiment and overall_sentiment are in [-1, 1]; relevance is in [0, 1]; importance_score is in [0, 10].
Return ONLY the JSON object above with actual data. No additional text or explanation."#;

/// Optional context sent alongside the article body.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub author: Option<String>,
}

pub struct ContentAnalyzer {
    llm: Arc<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl ContentAnalyzer {
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extract structured signal from `content`. Tool names in the result are
    /// normalized.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] when the response is not the
    /// expected JSON shape or a score is out of range, and
    /// [`IngestError::TransientIo`] / [`IngestError::CapabilityUnavailable`]
    /// when the language model fails.
    pub async fn analyze(
        &self,
        content: &str,
        context: &AnalysisContext,
    ) -> Result<AnalysisResult, IngestError> {
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(content, context)),
        ];
        let params = GenerationParams {
            temperature: 0.2,
            max_tokens: 8000,
        };

        let generation = self.llm.generate(&messages, params, self.policy).await?;
        let analysis = parse_analysis(&generation.content)?;

        tracing::info!(
            title = %analysis.title,
            tools = analysis.tool_mentions.len(),
            companies = analysis.company_mentions.len(),
            importance = analysis.importance_score,
            cost = format!("{:.4}", generation.metadata.estimated_cost),
            "content analysis completed"
        );
        Ok(analysis)
    }
}

fn build_user_prompt(content: &str, context: &AnalysisContext) -> String {
    let mut prompt = String::from("Analyze this article and extract comprehensive information:\n\n");
    prompt.extend(content.chars().take(MAX_PROMPT_CONTENT_CHARS));
    prompt.push_str("\n\n");
    if let Some(url) = &context.url {
        let _ = writeln!(prompt, "Source URL: {url}");
    }
    if let Some(file_name) = &context.file_name {
        let _ = writeln!(prompt, "File: {file_name}");
    }
    if let Some(author) = &context.author {
        let _ = writeln!(prompt, "Author: {author}");
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

/// Parse and validate a model response, then normalize tool names.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] on malformed JSON, a missing required
/// field, or an out-of-range score.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, IngestError> {
    let mut analysis: AnalysisResult = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| IngestError::Validation(format!("analysis response: {e}")))?;
    validate_ranges(&analysis)?;
    analysis.tool_mentions = normalize_mentions(std::mem::take(&mut analysis.tool_mentions));
    Ok(analysis)
}

fn validate_ranges(analysis: &AnalysisResult) -> Result<(), IngestError> {
    check_range("overall_sentiment", analysis.overall_sentiment, -1.0, 1.0)?;
    check_range("importance_score", analysis.importance_score, 0.0, 10.0)?;
    for mention in &analysis.tool_mentions {
        check_range(
            &format!("tool_mentions[{}].sentiment", mention.tool),
            mention.sentiment,
            -1.0,
            1.0,
        )?;
        check_range(
            &format!("tool_mentions[{}].relevance", mention.tool),
            mention.relevance,
            0.0,
            1.0,
        )?;
    }
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), IngestError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(IngestError::Validation(format!(
            "{field} = {value} is outside [{min}, {max}]"
        )))
    }
}
