//! Stage lifecycle: which screen is current, how control moves between
//! screens, and what data crosses the boundary.
//!
//! ```text
//! StageManager
//!   ├─ registry: StageType -> screen constructor
//!   ├─ stages:   StageType -> Stage (built on first use, reused after)
//!   ├─ current:  Option<StageType>
//!   └─ in-flight change: target + StageTransition + SharedData
//! ```

use std::fmt;
use std::str::FromStr;

mod context;
mod lifecycle;
mod manager;
mod registry;
mod shared_data;
mod transition;

pub use context::{StageContext, StageServices, TransitionGate};
pub use lifecycle::{Screen, Stage};
pub use manager::{ChangeOutcome, StageError, StageManager};
pub use registry::{ScreenFactory, StageRegistry};
pub use shared_data::{FromShared, SharedData, SharedValue, keys};
pub use transition::{Easing, StageTransition, TransitionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    Startup,
    Title,
    Config,
    SongSelect,
    SongTransition,
    Performance,
    Result,
}

impl StageType {
    pub const ALL: [Self; 7] = [
        Self::Startup,
        Self::Title,
        Self::Config,
        Self::SongSelect,
        Self::SongTransition,
        Self::Performance,
        Self::Result,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::Title => "Title",
            Self::Config => "Config",
            Self::SongSelect => "SongSelect",
            Self::SongTransition => "SongTransition",
            Self::Performance => "Performance",
            Self::Result => "Result",
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Where a stage is in its activation lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StagePhase {
    #[default]
    Inactive,
    FadeIn,
    Normal,
    FadeOut,
}

/// A stage change asked for by a screen (or any other caller).
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub target: StageType,
    pub transition: Option<StageTransition>,
    pub shared: Option<SharedData>,
}

impl StageRequest {
    pub fn new(target: StageType) -> Self {
        Self {
            target,
            transition: None,
            shared: None,
        }
    }

    pub fn with_transition(mut self, transition: StageTransition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn with_shared(mut self, shared: SharedData) -> Self {
        self.shared = Some(shared);
        self
    }
}

/// What a screen wants the manager to do after its update.
#[derive(Debug, Clone, Default)]
pub enum StageAction {
    #[default]
    None,
    Change(StageRequest),
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_types_round_trip_through_names() {
        for kind in StageType::ALL {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
        assert_eq!("songselect".parse(), Ok(StageType::SongSelect));
        assert_eq!("lobby".parse::<StageType>(), Err(()));
    }

    #[test]
    fn requests_default_to_no_transition_or_payload() {
        let req = StageRequest::new(StageType::Result);
        assert!(req.transition.is_none() && req.shared.is_none());
        let req = req
            .with_transition(StageTransition::fade(0.25))
            .with_shared(SharedData::new().with(keys::SONG_ID, "x"));
        assert_eq!(req.transition.map(|t| t.duration()), Some(0.25));
        assert_eq!(req.shared.map(|s| s.len()), Some(1));
    }
}
