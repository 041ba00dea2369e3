//! Ranking reference data read by the impact calculator.

use serde::{Deserialize, Serialize};

/// A tool's position in the current published ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRanking {
    pub tool_id: String,
    pub tool_name: String,
    pub rank: i32,
    /// Either on a 0–1 or a 0–100 scale; consumers normalize.
    pub score: f64,
}

impl ToolRanking {
    /// Score on the 0–1 scale. Values above 1 are treated as percentages.
    #[must_use]
    pub fn normalized_score(&self) -> f64 {
        if self.score > 1.0 {
            self.score / 100.0
        } else {
            self.score
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownTool {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCompany {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(score: f64) -> ToolRanking {
        ToolRanking {
            tool_id: "t1".to_string(),
            tool_name: "Cursor".to_string(),
            rank: 2,
            score,
        }
    }

    #[test]
    fn percentage_scores_are_scaled_down() {
        assert!((ranking(85.5).normalized_score() - 0.855).abs() < 1e-9);
    }

    #[test]
    fn unit_scores_are_unchanged() {
        assert!((ranking(0.42).normalized_score() - 0.42).abs() < 1e-9);
        assert!((ranking(1.0).normalized_score() - 1.0).abs() < 1e-9);
    }
}
