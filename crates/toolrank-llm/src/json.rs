//! Helpers for pulling a JSON payload out of model output.

/// Strips a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````)
/// and whitespace. Text without a fence is returned trimmed.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_is_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn json_fence_is_removed() {
        let raw = "```json\n{\"qualityScore\": 8}\n```";
        assert_eq!(strip_code_fence(raw), "{\"qualityScore\": 8}");
    }

    #[test]
    fn bare_fence_is_removed() {
        let raw = "```\n[1, 2]\n```\n";
        assert_eq!(strip_code_fence(raw), "[1, 2]");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        let raw = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fence(raw), "{\"a\": 1}");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
    }
}
