//! Per-model token pricing in USD per million tokens.

/// `(model, input, output)`.
const MODEL_PRICING: &[(&str, f64, f64)] = &[
    ("anthropic/claude-sonnet-4", 3.0, 15.0),
    ("anthropic/claude-opus-4", 15.0, 75.0),
    ("anthropic/claude-opus-4.1", 15.0, 75.0),
    ("anthropic/claude-3.5-sonnet", 3.0, 15.0),
    ("anthropic/claude-3-opus", 15.0, 75.0),
    ("openai/gpt-4", 30.0, 60.0),
    ("openai/gpt-4-turbo", 10.0, 30.0),
    ("openai/gpt-3.5-turbo", 0.5, 1.5),
];

/// Used for models missing from the table.
const FALLBACK_PRICING: (f64, f64) = (1.0, 2.0);

/// Estimated USD cost of a completion.
#[must_use]
pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    let (input, output) = MODEL_PRICING
        .iter()
        .find(|(name, _, _)| *name == model)
        .map_or(FALLBACK_PRICING, |&(_, i, o)| (i, o));

    f64::from(prompt_tokens) / 1_000_000.0 * input
        + f64::from(completion_tokens) / 1_000_000.0 * output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_table_price() {
        let cost = estimate_cost("anthropic/claude-sonnet-4", 1_000_000, 100_000);
        assert!((cost - 4.5).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn unknown_model_uses_fallback() {
        let cost = estimate_cost("mistral/unknown", 500_000, 500_000);
        assert!((cost - 1.5).abs() < 1e-9, "got {cost}");
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        assert!(estimate_cost("openai/gpt-4", 0, 0).abs() < f64::EPSILON);
    }
}
