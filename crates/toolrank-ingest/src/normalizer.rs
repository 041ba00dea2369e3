//! Tool-name normalization.
//!
//! Maps the free-text tool names a language model extracts onto the canonical
//! names used by the ranking. Resolution order:
//!
//! 1. exact match against [`KNOWN_TOOLS`]
//! 2. case-insensitive, trimmed lookup in the alias table
//! 3. fuzzy scan over [`KNOWN_TOOLS`] in declared order, first hit wins
//! 4. the input, unchanged
//!
//! Every output is either canonical or the unchanged input, so
//! `normalize(normalize(x)) == normalize(x)`.

use std::collections::HashMap;
use std::sync::LazyLock;

use toolrank_core::ToolMention;

/// Canonical tool names, in fuzzy-match priority order.
pub const KNOWN_TOOLS: &[&str] = &[
    "Claude Code",
    "GitHub Copilot",
    "Cursor",
    "ChatGPT Canvas",
    "v0",
    "Kiro",
    "Windsurf",
    "Google Jules",
    "Amazon Q Developer",
    "Lovable",
    "Aider",
    "Tabnine",
    "Bolt.new",
    "Augment Code",
    "Google Gemini Code Assist",
    "Replit Agent",
    "Zed",
    "OpenAI Codex CLI",
    "Devin",
    "Continue",
    "Claude Artifacts",
    "Sourcegraph Cody",
    "Cline",
    "OpenHands",
    "JetBrains AI Assistant",
    "Qodo Gen",
    "CodeRabbit",
    "Snyk Code",
    "Microsoft IntelliCode",
    "Sourcery",
    "Diffblue Cover",
    "Magic",
    "Supermaven",
    "Pieces",
    "Bito",
    "Mutable",
    "Sweep",
    "Menlo",
    "Phind",
    "Perplexity",
    "Factory",
    "Poolside",
    "Cosine Genie",
];

/// `(lowercase alias, canonical name)`.
const ALIASES: &[(&str, &str)] = &[
    // OpenAI
    ("gpt-4", "ChatGPT Canvas"),
    ("gpt-4o", "ChatGPT Canvas"),
    ("gpt-4-turbo", "ChatGPT Canvas"),
    ("chatgpt", "ChatGPT Canvas"),
    ("chatgpt canvas", "ChatGPT Canvas"),
    ("openai codex", "OpenAI Codex CLI"),
    ("codex", "OpenAI Codex CLI"),
    ("gpt-5", "ChatGPT Canvas"),
    ("gpt-5-codex", "OpenAI Codex CLI"),
    ("gpt-3.5", "ChatGPT Canvas"),
    ("gpt-3", "ChatGPT Canvas"),
    ("openai", "ChatGPT Canvas"),
    // Anthropic
    ("claude", "Claude Code"),
    ("claude 3", "Claude Code"),
    ("claude 3.5", "Claude Code"),
    ("claude 3.5 sonnet", "Claude Code"),
    ("claude sonnet", "Claude Code"),
    ("claude opus", "Claude Code"),
    ("claude haiku", "Claude Code"),
    ("claude artifacts", "Claude Artifacts"),
    ("claude canvas", "Claude Code"),
    ("claude code", "Claude Code"),
    ("claude 4", "Claude Code"),
    ("claude 4 sonnet", "Claude Code"),
    ("anthropic", "Claude Code"),
    // Google
    ("gemini", "Google Gemini Code Assist"),
    ("gemini pro", "Google Gemini Code Assist"),
    ("gemini ultra", "Google Gemini Code Assist"),
    ("gemini code", "Google Gemini Code Assist"),
    ("gemini 1.5", "Google Gemini Code Assist"),
    ("gemini 2.0", "Google Gemini Code Assist"),
    ("gemini code assist", "Google Gemini Code Assist"),
    ("jules", "Google Jules"),
    ("google jules", "Google Jules"),
    ("project jules", "Google Jules"),
    ("google ai", "Google Gemini Code Assist"),
    ("bard", "Google Gemini Code Assist"),
    // GitHub / Microsoft
    ("copilot", "GitHub Copilot"),
    ("github copilot", "GitHub Copilot"),
    ("copilot x", "GitHub Copilot"),
    ("copilot chat", "GitHub Copilot"),
    ("copilot workspace", "GitHub Copilot"),
    ("microsoft copilot", "GitHub Copilot"),
    ("vs code copilot", "GitHub Copilot"),
    // Amazon
    ("codewhisperer", "Amazon Q Developer"),
    ("amazon q", "Amazon Q Developer"),
    ("q developer", "Amazon Q Developer"),
    ("aws codewhisperer", "Amazon Q Developer"),
    ("amazon codewhisperer", "Amazon Q Developer"),
    // Replit
    ("replit", "Replit Agent"),
    ("replit agent", "Replit Agent"),
    ("replit ai", "Replit Agent"),
    ("ghostwriter", "Replit Agent"),
    // Cognition
    ("cognition", "Devin"),
    ("cognition ai", "Devin"),
    ("devin", "Devin"),
    ("devin ai", "Devin"),
    ("cursor", "Cursor"),
    ("cursor ai", "Cursor"),
    ("cursor editor", "Cursor"),
    ("windsurf", "Windsurf"),
    ("codeium", "Windsurf"),
    ("codeium windsurf", "Windsurf"),
    ("v0", "v0"),
    ("v0.dev", "v0"),
    ("vercel v0", "v0"),
    ("aider", "Aider"),
    ("aider chat", "Aider"),
    ("tabnine", "Tabnine"),
    ("tabnine ai", "Tabnine"),
    ("cody", "Sourcegraph Cody"),
    ("sourcegraph cody", "Sourcegraph Cody"),
    ("sourcegraph", "Sourcegraph Cody"),
    ("continue", "Continue"),
    ("continue dev", "Continue"),
    ("continue.dev", "Continue"),
    // Cline was Claude-Dev
    ("cline", "Cline"),
    ("claude-dev", "Cline"),
    ("claude dev", "Cline"),
    ("openhands", "OpenHands"),
    ("open hands", "OpenHands"),
    ("all hands", "OpenHands"),
    ("jetbrains ai", "JetBrains AI Assistant"),
    ("intellij ai", "JetBrains AI Assistant"),
    ("jetbrains ai assistant", "JetBrains AI Assistant"),
    ("pycharm ai", "JetBrains AI Assistant"),
    ("webstorm ai", "JetBrains AI Assistant"),
    ("qodo", "Qodo Gen"),
    ("qodo gen", "Qodo Gen"),
    ("codiumai", "Qodo Gen"),
    ("codium ai", "Qodo Gen"),
    ("coderabbit", "CodeRabbit"),
    ("code rabbit", "CodeRabbit"),
    ("bolt", "Bolt.new"),
    ("bolt.new", "Bolt.new"),
    ("stackblitz bolt", "Bolt.new"),
    ("augment", "Augment Code"),
    ("augment code", "Augment Code"),
    ("augment ai", "Augment Code"),
    ("lovable", "Lovable"),
    ("lovable.dev", "Lovable"),
    ("lovable ai", "Lovable"),
    ("zed", "Zed"),
    ("zed ai", "Zed"),
    ("zed editor", "Zed"),
    ("kiro", "Kiro"),
    ("kiro ai", "Kiro"),
    ("snyk", "Snyk Code"),
    ("snyk code", "Snyk Code"),
    ("intellicode", "Microsoft IntelliCode"),
    ("microsoft intellicode", "Microsoft IntelliCode"),
    ("visual studio intellicode", "Microsoft IntelliCode"),
    ("sourcery", "Sourcery"),
    ("sourcery ai", "Sourcery"),
    ("diffblue", "Diffblue Cover"),
    ("diffblue cover", "Diffblue Cover"),
    ("magic", "Magic"),
    ("magic.dev", "Magic"),
    ("magic ai", "Magic"),
    ("supermaven", "Supermaven"),
    ("super maven", "Supermaven"),
    ("pieces", "Pieces"),
    ("pieces for developers", "Pieces"),
    ("pieces app", "Pieces"),
    ("bito", "Bito"),
    ("bito ai", "Bito"),
    ("mutable", "Mutable"),
    ("mutable ai", "Mutable"),
    ("sweep", "Sweep"),
    ("sweep ai", "Sweep"),
    ("menlo", "Menlo"),
    ("menlo security", "Menlo"),
    ("phind", "Phind"),
    ("phind.com", "Phind"),
    ("perplexity", "Perplexity"),
    ("perplexity ai", "Perplexity"),
    ("factory", "Factory"),
    ("factory ai", "Factory"),
    ("poolside", "Poolside"),
    ("poolside ai", "Poolside"),
    ("cosine", "Cosine Genie"),
    ("genie", "Cosine Genie"),
    ("cosine genie", "Cosine Genie"),
];

static ALIAS_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| ALIASES.iter().copied().collect());

/// Words shorter than this do not count toward a fuzzy word match.
const MIN_SIGNIFICANT_WORD_CHARS: usize = 4;

/// Size of the mapping tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerStats {
    pub known_tools: usize,
    pub total_aliases: usize,
    pub average_aliases_per_tool: f64,
}

/// Resolve `raw` to a canonical tool name, or return it unchanged.
#[must_use]
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() || KNOWN_TOOLS.contains(&raw) {
        return raw.to_owned();
    }

    let lower = raw.trim().to_lowercase();
    if let Some(canonical) = ALIAS_INDEX.get(lower.as_str()) {
        return (*canonical).to_owned();
    }

    fuzzy_match(&raw.to_lowercase()).map_or_else(|| raw.to_owned(), str::to_owned)
}

fn fuzzy_match(lower: &str) -> Option<&'static str> {
    let significant: Vec<&str> = lower
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_CHARS)
        .collect();

    KNOWN_TOOLS.iter().copied().find(|known| {
        let known_lower = known.to_lowercase();
        if known_lower.contains(lower) || lower.contains(known_lower.as_str()) {
            return true;
        }
        if significant.is_empty() {
            return false;
        }
        let known_words: Vec<&str> = known_lower.split_whitespace().collect();
        let matching = significant
            .iter()
            .filter(|w| {
                known_words
                    .iter()
                    .any(|kw| kw.contains(**w) || w.contains(kw))
            })
            .count();
        // At least half of the significant words must match.
        matching * 2 >= significant.len()
    })
}

/// Normalize the `tool` field of every mention.
#[must_use]
pub fn normalize_mentions(mentions: Vec<ToolMention>) -> Vec<ToolMention> {
    mentions
        .into_iter()
        .map(|m| ToolMention {
            tool: normalize(&m.tool),
            ..m
        })
        .collect()
}

#[must_use]
pub fn known_tools() -> &'static [&'static str] {
    KNOWN_TOOLS
}

/// Every alias that maps to `canonical`, in table order.
#[must_use]
pub fn aliases_for(canonical: &str) -> Vec<&'static str> {
    ALIASES
        .iter()
        .filter(|(_, target)| *target == canonical)
        .map(|(alias, _)| *alias)
        .collect()
}

#[must_use]
pub fn is_known_alias(name: &str) -> bool {
    ALIAS_INDEX.contains_key(name.trim().to_lowercase().as_str())
}

#[must_use]
pub fn stats() -> NormalizerStats {
    let known_tools = KNOWN_TOOLS.len();
    let total_aliases = ALIAS_INDEX.len();
    #[allow(clippy::cast_precision_loss)]
    let average_aliases_per_tool = total_aliases as f64 / known_tools as f64;
    NormalizerStats {
        known_tools,
        total_aliases,
        average_aliases_per_tool,
    }
}

#[cfg(test)]
#[path = "normalizer_test.rs"]
mod tests;
