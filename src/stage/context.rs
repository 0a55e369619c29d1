use log::debug;

use crate::assets::AssetManager;
use crate::core::audio::Mixer;
use crate::core::input::InputQueue;
use crate::game::options::PlayerOptions;
use crate::game::song::SongLibrary;

/// Debounce guard owned by the driving loop: at most one stage transition
/// may be triggered per frame, and none within `cooldown` seconds of the
/// previous one.
#[derive(Debug, Clone)]
pub struct TransitionGate {
    frame: u64,
    marked_frame: Option<u64>,
    cooldown: f32,
    since_mark: f32,
}

impl Default for TransitionGate {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TransitionGate {
    pub fn new(cooldown: f32) -> Self {
        Self {
            frame: 0,
            marked_frame: None,
            cooldown: cooldown.max(0.0),
            since_mark: f32::MAX,
        }
    }

    pub fn begin_frame(&mut self, dt: f32) {
        self.frame += 1;
        if dt.is_finite() && dt > 0.0 {
            self.since_mark += dt;
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn can_perform_stage_transition(&self) -> bool {
        self.marked_frame != Some(self.frame) && self.since_mark >= self.cooldown
    }

    pub fn mark_stage_transition(&mut self) {
        self.marked_frame = Some(self.frame);
        self.since_mark = 0.0;
    }
}

/// Collaborators a stage may touch from its hooks, borrowed for one call.
pub struct StageContext<'a> {
    pub assets: &'a mut AssetManager,
    pub input: &'a mut InputQueue,
    pub gate: &'a mut TransitionGate,
    pub audio: &'a mut Mixer,
    pub options: &'a mut PlayerOptions,
    pub songs: &'a SongLibrary,
}

impl StageContext<'_> {
    /// Checks and marks the gate in one step; stages call this right
    /// before asking for a stage change.
    pub fn claim_transition(&mut self) -> bool {
        if self.gate.can_perform_stage_transition() {
            self.gate.mark_stage_transition();
            true
        } else {
            debug!("Transition gate closed on frame {}", self.gate.frame());
            false
        }
    }
}

/// Owning bundle behind `StageContext`, kept by the driving loop.
pub struct StageServices {
    pub assets: AssetManager,
    pub input: InputQueue,
    pub gate: TransitionGate,
    pub audio: Mixer,
    pub options: PlayerOptions,
    pub songs: SongLibrary,
}

impl StageServices {
    pub fn new(assets: AssetManager, songs: SongLibrary) -> Self {
        Self {
            assets,
            input: InputQueue::new(),
            gate: TransitionGate::default(),
            audio: Mixer::new(),
            options: PlayerOptions::default(),
            songs,
        }
    }

    pub fn context(&mut self) -> StageContext<'_> {
        StageContext {
            assets: &mut self.assets,
            input: &mut self.input,
            gate: &mut self.gate,
            audio: &mut self.audio,
            options: &mut self.options,
            songs: &self.songs,
        }
    }
}
