use serde::{Deserialize, Serialize};

// ITG tap windows in seconds, before the judge's own timing leeway is added.
pub const WINDOW_FANTASTIC: f32 = 0.0215;
pub const WINDOW_EXCELLENT: f32 = 0.0430;
pub const WINDOW_GREAT: f32 = 0.1020;
pub const WINDOW_DECENT: f32 = 0.1350;
pub const WINDOW_WAY_OFF: f32 = 0.1800;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JudgeGrade {
    Fantastic, // W1
    Excellent, // W2
    Great,     // W3
    Decent,    // W4
    WayOff,    // W5
    Miss,
}

impl JudgeGrade {
    pub const ALL: [Self; 6] = [
        Self::Fantastic,
        Self::Excellent,
        Self::Great,
        Self::Decent,
        Self::WayOff,
        Self::Miss,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fantastic => "Fantastic",
            Self::Excellent => "Excellent",
            Self::Great => "Great",
            Self::Decent => "Decent",
            Self::WayOff => "Way Off",
            Self::Miss => "Miss",
        }
    }

    /// Whether this grade keeps the combo going.
    pub const fn continues_combo(self) -> bool {
        matches!(self, Self::Fantastic | Self::Excellent | Self::Great)
    }
}

/// Maps a signed timing error (seconds, negative = early) to a grade.
/// Taps outside the widest window are ignored and return `None`.
#[inline(always)]
pub fn judge_offset(time_error: f32) -> Option<JudgeGrade> {
    let abs = time_error.abs();
    if abs <= WINDOW_FANTASTIC {
        Some(JudgeGrade::Fantastic)
    } else if abs <= WINDOW_EXCELLENT {
        Some(JudgeGrade::Excellent)
    } else if abs <= WINDOW_GREAT {
        Some(JudgeGrade::Great)
    } else if abs <= WINDOW_DECENT {
        Some(JudgeGrade::Decent)
    } else if abs <= WINDOW_WAY_OFF {
        Some(JudgeGrade::WayOff)
    } else {
        None
    }
}

pub const fn grade_points_for(grade: JudgeGrade) -> i64 {
    match grade {
        JudgeGrade::Fantastic => 5,
        JudgeGrade::Excellent => 4,
        JudgeGrade::Great => 2,
        JudgeGrade::Decent => 0,
        JudgeGrade::WayOff => -6,
        JudgeGrade::Miss => -12,
    }
}

/// Per-grade tally for one play.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCounts {
    pub fantastic: u32,
    pub excellent: u32,
    pub great: u32,
    pub decent: u32,
    pub way_off: u32,
    pub miss: u32,
}

impl JudgmentCounts {
    pub fn record(&mut self, grade: JudgeGrade) {
        *self.slot_mut(grade) += 1;
    }

    pub const fn get(&self, grade: JudgeGrade) -> u32 {
        match grade {
            JudgeGrade::Fantastic => self.fantastic,
            JudgeGrade::Excellent => self.excellent,
            JudgeGrade::Great => self.great,
            JudgeGrade::Decent => self.decent,
            JudgeGrade::WayOff => self.way_off,
            JudgeGrade::Miss => self.miss,
        }
    }

    pub fn total(&self) -> u32 {
        JudgeGrade::ALL.iter().map(|g| self.get(*g)).sum()
    }

    fn slot_mut(&mut self, grade: JudgeGrade) -> &mut u32 {
        match grade {
            JudgeGrade::Fantastic => &mut self.fantastic,
            JudgeGrade::Excellent => &mut self.excellent,
            JudgeGrade::Great => &mut self.great,
            JudgeGrade::Decent => &mut self.decent,
            JudgeGrade::WayOff => &mut self.way_off,
            JudgeGrade::Miss => &mut self.miss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_itg_windows() {
        assert_eq!(judge_offset(0.0), Some(JudgeGrade::Fantastic));
        assert_eq!(judge_offset(-0.030), Some(JudgeGrade::Excellent));
        assert_eq!(judge_offset(0.090), Some(JudgeGrade::Great));
        assert_eq!(judge_offset(-0.120), Some(JudgeGrade::Decent));
        assert_eq!(judge_offset(0.170), Some(JudgeGrade::WayOff));
        assert_eq!(judge_offset(0.250), None, "taps past W5 are not judged");
    }

    #[test]
    fn counts_track_every_grade() {
        let mut counts = JudgmentCounts::default();
        for grade in JudgeGrade::ALL {
            counts.record(grade);
        }
        counts.record(JudgeGrade::Miss);
        assert_eq!(counts.total(), 7);
        assert_eq!(counts.get(JudgeGrade::Miss), 2);
        assert_eq!(counts.get(JudgeGrade::Great), 1);
    }
}
