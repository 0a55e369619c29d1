use serde::{Deserialize, Serialize};

use crate::game::judgment::JudgmentCounts;

/// Why a play ended.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    #[default]
    Unknown,
    Cleared,
    Failed,
    Quit,
}

impl CompletionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Cleared => "Cleared",
            Self::Failed => "Failed",
            Self::Quit => "Quit",
        }
    }
}

/// Result of one play, handed from gameplay to evaluation through the
/// shared-data bag. The default value is the zero summary used when the
/// evaluation screen is entered without one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub score: i64,
    pub max_combo: u32,
    pub counts: JudgmentCounts,
    pub total_notes: u32,
    pub final_life: f32,
    pub completion: CompletionReason,
}

impl PerformanceSummary {
    /// Score as a percentage of the all-Fantastic maximum, never negative.
    pub fn score_percent(&self) -> f64 {
        let possible = i64::from(self.total_notes)
            * crate::game::judgment::grade_points_for(crate::game::judgment::JudgeGrade::Fantastic);
        if possible <= 0 {
            return 0.0;
        }
        (self.score.max(0) as f64 / possible as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::judgment::JudgeGrade;

    #[test]
    fn default_summary_is_zeroed_with_unknown_reason() {
        let s = PerformanceSummary::default();
        assert_eq!(s.score, 0);
        assert_eq!(s.max_combo, 0);
        assert_eq!(s.total_notes, 0);
        assert_eq!(s.counts.total(), 0);
        assert_eq!(s.final_life, 0.0);
        assert_eq!(s.completion, CompletionReason::Unknown);
        assert_eq!(s.score_percent(), 0.0);
    }

    #[test]
    fn score_percent_is_relative_to_fantastic_max() {
        let mut counts = JudgmentCounts::default();
        counts.record(JudgeGrade::Fantastic);
        counts.record(JudgeGrade::Excellent);
        let s = PerformanceSummary {
            score: 9,
            max_combo: 2,
            counts,
            total_notes: 2,
            final_life: 0.516,
            completion: CompletionReason::Cleared,
        };
        assert!((s.score_percent() - 90.0).abs() < 1e-9);
        assert_eq!(s.counts.total(), s.total_notes);
    }
}
