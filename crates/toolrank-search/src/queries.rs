//! Built-in search queries.
//!
//! Each provider runs one primary query plus supplementary queries that rotate
//! with the day of the week so consecutive daily runs cover different angles.

use chrono::Weekday;

pub const TAVILY_PRIMARY_QUERY: &str = "AI coding assistant news OR AI code generation tools OR \
GitHub Copilot OR Cursor AI OR Claude Code OR Windsurf OR Devin AI OR Replit Agent OR \
Amazon Q Developer OR AI developer tools announcement OR agentic coding 2026";

const TAVILY_ROTATION: [&str; 7] = [
    "AI coding assistant funding startup investment 2026",
    "autonomous coding agent Devin Replit release update",
    "\"GitHub Copilot\" OR \"Cursor\" announcement 2026",
    "AI code review tool launch enterprise",
    "SWE-bench coding agent benchmark results",
    "AI pair programming tool VS Code JetBrains",
    "Claude Anthropic developer tools API update",
];

pub const BRAVE_ANALYST_QUERY: &str = "AI coding tools news announcements launches updates \
site:techcrunch.com OR site:theverge.com OR site:arstechnica.com OR site:venturebeat.com OR \
site:wired.com OR \"GitHub Copilot\" OR \"Cursor\" OR \"Claude Code\" OR \"Windsurf\" OR \
\"Devin\" OR \"Replit\" OR \"Codeium\"";

/// Two consecutive entries of the Tavily rotation, starting at the weekday's
/// index (Sunday = 0).
#[must_use]
pub fn tavily_supplementary(weekday: Weekday) -> [&'static str; 2] {
    let day = weekday.num_days_from_sunday() as usize;
    [
        TAVILY_ROTATION[day % TAVILY_ROTATION.len()],
        TAVILY_ROTATION[(day + 1) % TAVILY_ROTATION.len()],
    ]
}

/// The Brave supplementary query for `weekday`. Weekends repeat the analyst
/// query.
#[must_use]
pub fn brave_supplementary(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "\"GitHub Copilot\" OR \"Cursor\" OR \"Claude Code\" announcement 2026",
        Weekday::Tue => "AI code assistant funding startup investment",
        Weekday::Wed => "autonomous coding agent Devin Replit release update",
        Weekday::Thu => "AI developer tools benchmark SWE-bench evaluation",
        Weekday::Fri => "Anthropic OpenAI coding assistant API update",
        Weekday::Sat | Weekday::Sun => BRAVE_ANALYST_QUERY,
    }
}

/// Brave `freshness` parameter for a look-back window.
#[must_use]
pub fn brave_freshness(days: u32) -> &'static str {
    if days <= 1 {
        "pd"
    } else {
        "pw"
    }
}
