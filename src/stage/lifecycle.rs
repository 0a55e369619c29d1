use log::{debug, trace};

use super::{SharedData, StageAction, StageContext, StagePhase, StageType};
use crate::core::gfx::Canvas;

/// Behaviour of one concrete screen.
///
/// Only `on_update` and `on_draw` are required. Hooks never return errors:
/// a screen that fails to load an asset falls back to a placeholder and
/// carries on.
pub trait Screen {
    /// Load per-activation resources and read the incoming shared data.
    fn on_activate(&mut self, _ctx: &mut StageContext<'_>, _shared: &SharedData) {}

    /// Runs once, on the first update after activation.
    fn on_first_update(&mut self, _ctx: &mut StageContext<'_>) {}

    fn on_update(&mut self, ctx: &mut StageContext<'_>, dt: f32) -> StageAction;

    fn on_draw(&self, canvas: &mut dyn Canvas, dt: f32);

    /// Release per-activation resources.
    fn on_deactivate(&mut self) {}

    /// Release everything else. Called once, at manager teardown.
    fn on_dispose(&mut self) {}

    fn on_transition_out_started(&mut self) {}

    fn on_transition_in_started(&mut self) {}

    fn on_transition_completed(&mut self) {}

    /// Seconds the screen spends in `FadeIn` before promoting itself to
    /// `Normal` when nothing else completes the fade.
    fn fade_in_duration(&self) -> f32 {
        0.0
    }
}

/// A screen plus the lifecycle bookkeeping shared by every screen.
///
/// ```text
/// Inactive --activate--> FadeIn --(fade done)--> Normal
///   ^                                              |
///   +------------deactivate------- FadeOut <--transition_out
/// ```
pub struct Stage {
    kind: StageType,
    phase: StagePhase,
    shared: SharedData,
    first_update_pending: bool,
    phase_elapsed: f32,
    activations: u32,
    disposed: bool,
    screen: Box<dyn Screen>,
}

impl Stage {
    pub fn new(kind: StageType, screen: Box<dyn Screen>) -> Self {
        Self {
            kind,
            phase: StagePhase::Inactive,
            shared: SharedData::new(),
            first_update_pending: false,
            phase_elapsed: 0.0,
            activations: 0,
            disposed: false,
            screen,
        }
    }

    pub fn kind(&self) -> StageType {
        self.kind
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != StagePhase::Inactive
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Shared data received at the last activation; empty once deactivated.
    pub fn shared(&self) -> &SharedData {
        &self.shared
    }

    /// How many times this instance has been activated.
    pub fn activations(&self) -> u32 {
        self.activations
    }

    //--- Lifecycle ---------------------------------------------------------

    pub fn activate(&mut self, shared: SharedData, ctx: &mut StageContext<'_>) {
        if self.disposed {
            debug!("{} is disposed; ignoring activate", self.kind);
            return;
        }
        if self.is_active() {
            debug!("{} already active ({:?}); ignoring activate", self.kind, self.phase);
            return;
        }
        self.shared = shared;
        self.first_update_pending = true;
        self.phase_elapsed = 0.0;
        self.phase = StagePhase::FadeIn;
        self.activations += 1;
        trace!("{} activated with {} shared value(s)", self.kind, self.shared.len());
        self.screen.on_activate(ctx, &self.shared);
    }

    pub fn update(&mut self, dt: f32, ctx: &mut StageContext<'_>) -> StageAction {
        if !self.is_active() {
            return StageAction::None;
        }
        if self.first_update_pending {
            self.first_update_pending = false;
            self.screen.on_first_update(ctx);
        }

        self.phase_elapsed += dt.max(0.0);
        if self.phase == StagePhase::FadeIn && self.phase_elapsed >= self.screen.fade_in_duration() {
            self.phase = StagePhase::Normal;
            self.screen.on_transition_completed();
        }

        self.screen.on_update(ctx, dt)
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, dt: f32) {
        if self.is_active() {
            self.screen.on_draw(canvas, dt);
        }
    }

    pub fn transition_out(&mut self) {
        if !self.is_active() {
            return;
        }
        self.phase = StagePhase::FadeOut;
        self.phase_elapsed = 0.0;
        self.screen.on_transition_out_started();
    }

    pub fn transition_in(&mut self) {
        if !self.is_active() {
            return;
        }
        self.phase = StagePhase::FadeIn;
        self.phase_elapsed = 0.0;
        self.screen.on_transition_in_started();
    }

    pub fn transition_complete(&mut self) {
        if !self.is_active() {
            return;
        }
        self.phase = StagePhase::Normal;
        self.screen.on_transition_completed();
    }

    pub fn deactivate(&mut self) {
        if !self.is_active() {
            return;
        }
        self.screen.on_deactivate();
        self.phase = StagePhase::Inactive;
        self.first_update_pending = false;
        self.shared.clear();
        trace!("{} deactivated", self.kind);
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.deactivate();
        self.screen.on_dispose();
        self.disposed = true;
        debug!("{} disposed", self.kind);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::{AssetManager, MemorySource};
    use crate::core::gfx::{Rect, RenderList};
    use crate::game::song::SongLibrary;
    use crate::stage::{StageServices, keys};
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) type EventLog = Rc<RefCell<Vec<String>>>;
    pub(crate) type NextAction = Rc<RefCell<Option<StageAction>>>;

    /// Screen that records every hook it receives.
    pub(crate) struct Recorder {
        pub(crate) name: &'static str,
        pub(crate) log: EventLog,
        pub(crate) fade_in: f32,
        pub(crate) next: NextAction,
    }

    impl Recorder {
        pub(crate) fn new(name: &'static str, log: &EventLog) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                fade_in: 0.0,
                next: NextAction::default(),
            }
        }

        /// Shares the slot the test fills to make the recorder request an action.
        pub(crate) fn scripted(name: &'static str, log: &EventLog, next: &NextAction) -> Self {
            Self {
                next: Rc::clone(next),
                ..Self::new(name, log)
            }
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Screen for Recorder {
        fn on_activate(&mut self, _ctx: &mut StageContext<'_>, shared: &SharedData) {
            let tag = shared.get_or::<String>(keys::SONG_ID, String::new());
            if tag.is_empty() {
                self.record("activate");
            } else {
                self.record(&format!("activate({tag})"));
            }
        }
        fn on_first_update(&mut self, _ctx: &mut StageContext<'_>) {
            self.record("first_update");
        }
        fn on_update(&mut self, _ctx: &mut StageContext<'_>, _dt: f32) -> StageAction {
            self.record("update");
            self.next.borrow_mut().take().unwrap_or_default()
        }
        fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
            canvas.quad(Rect::new(0.0, 0.0, 1.0, 1.0), [1.0; 4]);
            canvas.text("recorder", self.name, [0.0, 0.0], [1.0; 4]);
        }
        fn on_deactivate(&mut self) {
            self.record("deactivate");
        }
        fn on_dispose(&mut self) {
            self.record("dispose");
        }
        fn on_transition_out_started(&mut self) {
            self.record("out");
        }
        fn on_transition_in_started(&mut self) {
            self.record("in");
        }
        fn on_transition_completed(&mut self) {
            self.record("complete");
        }
        fn fade_in_duration(&self) -> f32 {
            self.fade_in
        }
    }

    pub(crate) fn services() -> StageServices {
        StageServices::new(
            AssetManager::new(Box::new(MemorySource::new())),
            SongLibrary::demo(),
        )
    }

    fn drain(log: &EventLog) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn activate_is_guarded_against_double_activation() {
        let log = EventLog::default();
        let mut svc = services();
        let mut stage = Stage::new(StageType::Title, Box::new(Recorder::new("t", &log)));

        stage.activate(SharedData::new(), &mut svc.context());
        stage.activate(SharedData::new(), &mut svc.context());
        assert_eq!(drain(&log), ["t:activate"]);
        assert_eq!(stage.phase(), StagePhase::FadeIn);
        assert_eq!(stage.activations(), 1);
    }

    #[test]
    fn first_update_fires_once_per_activation() {
        let log = EventLog::default();
        let mut svc = services();
        let mut stage = Stage::new(StageType::Title, Box::new(Recorder::new("t", &log)));
        stage.activate(SharedData::new(), &mut svc.context());
        stage.update(0.1, &mut svc.context());
        stage.update(0.1, &mut svc.context());
        stage.deactivate();
        stage.activate(SharedData::new(), &mut svc.context());
        stage.update(0.1, &mut svc.context());
        assert_eq!(
            drain(&log),
            [
                "t:activate",
                "t:first_update",
                "t:complete",
                "t:update",
                "t:update",
                "t:deactivate",
                "t:activate",
                "t:first_update",
                "t:complete",
                "t:update"
            ]
        );
    }

    #[test]
    fn fade_in_self_promotes_after_its_duration() {
        let log = EventLog::default();
        let mut svc = services();
        let mut recorder = Recorder::new("t", &log);
        recorder.fade_in = 0.5;
        let mut stage = Stage::new(StageType::Title, Box::new(recorder));
        stage.activate(SharedData::new(), &mut svc.context());
        stage.update(0.25, &mut svc.context());
        assert_eq!(stage.phase(), StagePhase::FadeIn);
        stage.update(0.25, &mut svc.context());
        assert_eq!(stage.phase(), StagePhase::Normal);
    }

    #[test]
    fn deactivate_resets_phase_and_clears_shared_from_any_phase() {
        let log = EventLog::default();
        let mut svc = services();
        let mut stage = Stage::new(StageType::Result, Box::new(Recorder::new("r", &log)));
        let prep: [fn(&mut Stage); 3] = [
            |_| {},
            |s| s.transition_complete(),
            |s| s.transition_out(),
        ];
        for (i, prepare) in prep.iter().enumerate() {
            stage.activate(
                SharedData::new().with(keys::SONG_ID, "abc"),
                &mut svc.context(),
            );
            prepare(&mut stage);
            assert!(stage.is_active(), "case {i}");
            assert_eq!(stage.shared().len(), 1);
            stage.deactivate();
            assert_eq!(stage.phase(), StagePhase::Inactive, "case {i}");
            assert!(stage.shared().is_empty(), "case {i}");
        }
    }

    #[test]
    fn inactive_stage_ignores_update_draw_and_phase_hooks() {
        let log = EventLog::default();
        let mut svc = services();
        let mut stage = Stage::new(StageType::Title, Box::new(Recorder::new("t", &log)));
        let mut list = RenderList::new();
        assert!(matches!(stage.update(0.1, &mut svc.context()), StageAction::None));
        stage.draw(&mut list, 0.1);
        stage.transition_out();
        stage.transition_in();
        stage.transition_complete();
        stage.deactivate();
        assert!(list.is_empty());
        assert!(drain(&log).is_empty());
        assert_eq!(stage.phase(), StagePhase::Inactive);
    }

    #[test]
    fn dispose_deactivates_once_and_is_idempotent() {
        let log = EventLog::default();
        let mut svc = services();
        let mut stage = Stage::new(StageType::Title, Box::new(Recorder::new("t", &log)));
        stage.activate(SharedData::new(), &mut svc.context());
        stage.dispose();
        stage.dispose();
        stage.activate(SharedData::new(), &mut svc.context());
        assert_eq!(drain(&log), ["t:activate", "t:deactivate", "t:dispose"]);
        assert!(stage.is_disposed());
        assert!(!stage.is_active());
    }
}
