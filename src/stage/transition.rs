use log::debug;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    SmoothStep,
}

impl Easing {
    #[inline(always)]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::SmoothStep => "SmoothStep",
        }
    }
}

impl FromStr for Easing {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "smoothstep" | "smooth" => Ok(Self::SmoothStep),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionKind {
    Instant,
    Fade { duration: f32, easing: Easing },
}

/// Timing and blend policy for one stage change.
///
/// The manager takes ownership of a transition for the lifetime of a single
/// change and drops it on completion, so an instance is never reused.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTransition {
    kind: TransitionKind,
    elapsed: f32,
    started: bool,
}

impl Default for StageTransition {
    fn default() -> Self {
        Self::instant()
    }
}

impl StageTransition {
    pub const fn instant() -> Self {
        Self {
            kind: TransitionKind::Instant,
            elapsed: 0.0,
            started: false,
        }
    }

    pub fn fade(duration: f32) -> Self {
        Self::fade_eased(duration, Easing::Linear)
    }

    /// A non-positive or non-finite duration degrades to an instant change.
    pub fn fade_eased(duration: f32, easing: Easing) -> Self {
        if !(duration.is_finite() && duration > 0.0) {
            debug!("Fade duration {duration} is not positive; using an instant transition");
            return Self::instant();
        }
        Self {
            kind: TransitionKind::Fade { duration, easing },
            elapsed: 0.0,
            started: false,
        }
    }

    pub const fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub const fn duration(&self) -> f32 {
        match self.kind {
            TransitionKind::Instant => 0.0,
            TransitionKind::Fade { duration, .. } => duration,
        }
    }

    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub const fn is_instant(&self) -> bool {
        matches!(self.kind, TransitionKind::Instant)
    }

    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.started = true;
    }

    pub fn update(&mut self, dt: f32) {
        if self.started && dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.started && self.elapsed >= self.duration()
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if !self.started {
            return 0.0;
        }
        match self.kind {
            TransitionKind::Instant => 1.0,
            TransitionKind::Fade { duration, .. } => (self.elapsed / duration).clamp(0.0, 1.0),
        }
    }

    fn eased(&self) -> f32 {
        match self.kind {
            TransitionKind::Instant => self.progress(),
            TransitionKind::Fade { easing, .. } => easing.apply(self.progress()),
        }
    }

    /// How much of the outgoing stage is still visible.
    pub fn fade_out_alpha(&self) -> f32 {
        1.0 - self.eased()
    }

    /// How much of the incoming stage would be visible.
    pub fn fade_in_alpha(&self) -> f32 {
        self.eased()
    }
}
