pub mod chart;
pub mod judgment;
pub mod life;
pub mod options;
pub mod scores;
pub mod song;
pub mod stage_stats;
