use crate::game::judgment::JudgeGrade;

pub const LIFE_START: f32 = 0.5;

// Simply Love's LifePercentChange values for tap grades.
pub const LIFE_FANTASTIC: f32 = 0.008;
pub const LIFE_EXCELLENT: f32 = 0.008;
pub const LIFE_GREAT: f32 = 0.004;
pub const LIFE_DECENT: f32 = 0.0;
pub const LIFE_WAY_OFF: f32 = -0.050;
pub const LIFE_MISS: f32 = -0.100;

pub const fn life_delta_for(grade: JudgeGrade) -> f32 {
    match grade {
        JudgeGrade::Fantastic => LIFE_FANTASTIC,
        JudgeGrade::Excellent => LIFE_EXCELLENT,
        JudgeGrade::Great => LIFE_GREAT,
        JudgeGrade::Decent => LIFE_DECENT,
        JudgeGrade::WayOff => LIFE_WAY_OFF,
        JudgeGrade::Miss => LIFE_MISS,
    }
}

/// Applies a grade to a life value, clamped to the meter.
#[inline(always)]
pub fn apply(life: f32, grade: JudgeGrade) -> f32 {
    (life + life_delta_for(grade)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn life_is_clamped_to_meter() {
        let mut life = 0.05;
        life = apply(life, JudgeGrade::Miss);
        assert_eq!(life, 0.0);
        life = 0.999;
        life = apply(life, JudgeGrade::Fantastic);
        assert_eq!(life, 1.0);
    }
}
