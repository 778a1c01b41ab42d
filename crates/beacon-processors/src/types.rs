//! Shared result types for the domain processors (spec §4.11).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// Score bands from spec §4.11's "classify importance by score band."
    pub fn from_score(score: i32) -> Self {
        if score >= 70 {
            Importance::High
        } else if score >= 40 {
            Importance::Medium
        } else {
            Importance::Low
        }
    }
}

/// What one processor invocation accomplished; the pipeline orchestrator
/// wraps this with stage name, timing, and status (spec §4.10).
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub items_considered: usize,
    pub items_new_or_changed: usize,
    pub items_written: usize,
    pub outputs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bands_match_spec() {
        assert_eq!(Importance::from_score(95), Importance::High);
        assert_eq!(Importance::from_score(70), Importance::High);
        assert_eq!(Importance::from_score(69), Importance::Medium);
        assert_eq!(Importance::from_score(40), Importance::Medium);
        assert_eq!(Importance::from_score(10), Importance::Low);
    }
}
