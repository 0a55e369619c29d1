//=========================================================================
// Stage Manager
//=========================================================================
//
// Sole authority over which stage is current and how control moves
// between stages.
//
// A change runs in three steps:
//   change_stage()        start the transition, fade the current stage out
//   update() ...          advance the transition once per frame
//   complete_transition() deactivate outgoing, activate incoming
//
// Instant transitions run all three inside change_stage().
//
//=========================================================================

use log::{debug, error, info};
use rustc_hash::FxHashMap;
use std::fmt;

use super::{
    SharedData, Stage, StageAction, StageContext, StageRegistry, StageTransition, StageType,
};
use crate::core::gfx::{BLACK, Canvas, Rect, with_alpha};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageError {
    /// No constructor registered for the requested stage.
    Unregistered(StageType),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered(kind) => write!(f, "no screen registered for stage {kind}"),
        }
    }
}

impl std::error::Error for StageError {}

/// Result of a `change_stage` call that was not a misuse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The target is current by the time the call returned.
    Completed,
    /// A timed transition started; a later `update` completes it.
    Pending,
    /// Rejected: a transition is in flight or the manager is disposed.
    Ignored,
}

pub struct StageManager {
    registry: StageRegistry,
    stages: FxHashMap<StageType, Stage>,
    current: Option<StageType>,
    target: Option<StageType>,
    transition: Option<StageTransition>,
    pending_shared: Option<SharedData>,
    exit_requested: bool,
    disposed: bool,
}

impl StageManager {
    pub fn new(registry: StageRegistry) -> Self {
        Self {
            registry,
            stages: FxHashMap::default(),
            current: None,
            target: None,
            transition: None,
            pending_shared: None,
            exit_requested: false,
            disposed: false,
        }
    }

    //--- Observers ---------------------------------------------------------

    pub fn current_stage_type(&self) -> Option<StageType> {
        self.current
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.current.and_then(|kind| self.stages.get(&kind))
    }

    pub fn target_stage_type(&self) -> Option<StageType> {
        self.target
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn active_transition(&self) -> Option<&StageTransition> {
        self.transition.as_ref()
    }

    pub fn pending_shared(&self) -> Option<&SharedData> {
        self.pending_shared.as_ref()
    }

    pub fn stage(&self, kind: StageType) -> Option<&Stage> {
        self.stages.get(&kind)
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    /// Number of stage instances built so far.
    pub fn constructed_count(&self) -> usize {
        self.stages.len()
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    //--- Stage Changes -----------------------------------------------------

    /// Requests a change to `target`.
    ///
    /// Rejected (logged, `Ok(Ignored)`) while another transition is in
    /// flight or after disposal; an in-flight transition cannot be
    /// interrupted or redirected. Fails only when `target` has no
    /// registered screen.
    pub fn change_stage(
        &mut self,
        target: StageType,
        transition: Option<StageTransition>,
        shared: Option<SharedData>,
        ctx: &mut StageContext<'_>,
    ) -> Result<ChangeOutcome, StageError> {
        if self.disposed {
            debug!("Stage manager disposed; ignoring change to {target}");
            return Ok(ChangeOutcome::Ignored);
        }
        if let Some(busy) = self.target {
            debug!("Transition to {busy} in progress; ignoring change to {target}");
            return Ok(ChangeOutcome::Ignored);
        }

        self.ensure_stage(target)?;

        let mut transition = transition.unwrap_or_default();
        match self.current {
            Some(from) => info!(
                "Stage change {from} -> {target} ({:.2}s)",
                transition.duration()
            ),
            None => info!("Entering initial stage {target}"),
        }

        self.target = Some(target);
        self.pending_shared = Some(shared.unwrap_or_default());
        transition.start();
        let complete = transition.is_complete();
        self.transition = Some(transition);

        if let Some(from) = self.current
            && let Some(stage) = self.stages.get_mut(&from)
        {
            stage.transition_out();
        }

        if complete {
            self.complete_transition(ctx);
            Ok(ChangeOutcome::Completed)
        } else {
            Ok(ChangeOutcome::Pending)
        }
    }

    fn ensure_stage(&mut self, kind: StageType) -> Result<(), StageError> {
        if self.stages.contains_key(&kind) {
            return Ok(());
        }
        let Some(stage) = self.registry.build(kind) else {
            error!("Stage {kind} requested but no screen is registered for it");
            return Err(StageError::Unregistered(kind));
        };
        debug!("Constructed stage {kind}");
        self.stages.insert(kind, stage);
        Ok(())
    }

    fn complete_transition(&mut self, ctx: &mut StageContext<'_>) {
        let Some(target) = self.target.take() else {
            self.transition = None;
            return;
        };
        let shared = self.pending_shared.take().unwrap_or_default();

        // Outgoing is fully torn down before the incoming stage loads anything.
        if let Some(from) = self.current.take()
            && let Some(stage) = self.stages.get_mut(&from)
        {
            stage.deactivate();
        }

        self.current = Some(target);
        if let Some(stage) = self.stages.get_mut(&target) {
            stage.activate(shared, ctx);
            stage.transition_in();
            stage.transition_complete();
        }

        self.transition = None;
        info!("Stage {target} is now current");
    }

    //--- Frame Loop --------------------------------------------------------

    /// Advances any in-flight transition, then updates the current stage
    /// and applies whatever it asked for. While a transition is still in
    /// flight the outgoing stage sees an empty input queue and its requests
    /// are dropped.
    pub fn update(&mut self, dt: f32, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        if self.disposed {
            return Ok(());
        }

        if let Some(transition) = self.transition.as_mut() {
            transition.update(dt);
            if transition.is_complete() {
                self.complete_transition(ctx);
            }
        }

        // A stage fading out keeps its clock but no longer acts on input.
        let fading = self.transition.is_some();
        if fading {
            ctx.input.clear();
        }
        let action = match self.current.and_then(|kind| self.stages.get_mut(&kind)) {
            Some(stage) => stage.update(dt, ctx),
            None => StageAction::None,
        };
        if fading && !matches!(action, StageAction::None) {
            debug!("Dropping {action:?} from outgoing stage {:?}", self.current);
            return Ok(());
        }
        self.apply(action, ctx)
    }

    fn apply(&mut self, action: StageAction, ctx: &mut StageContext<'_>) -> Result<(), StageError> {
        match action {
            StageAction::None => Ok(()),
            StageAction::Change(request) => self
                .change_stage(request.target, request.transition, request.shared, ctx)
                .map(|_| ()),
            StageAction::Exit => {
                info!("Exit requested by {:?}", self.current);
                self.exit_requested = true;
                Ok(())
            }
        }
    }

    /// Draws the current stage. During a transition only the outgoing stage
    /// is drawn, under a black overlay that follows the fade-out alpha.
    pub fn draw(&self, dt: f32, canvas: &mut dyn Canvas) {
        if self.disposed {
            return;
        }
        if let Some(stage) = self.current_stage() {
            stage.draw(canvas, dt);
        }
        if let Some(transition) = &self.transition {
            let cover = 1.0 - transition.fade_out_alpha();
            if cover > 0.0 {
                canvas.quad(Rect::screen(), with_alpha(BLACK, cover));
            }
        }
    }

    //--- Teardown ----------------------------------------------------------

    /// Deactivates the current stage and disposes every constructed stage.
    /// The manager is inert afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(kind) = self.current.take()
            && let Some(stage) = self.stages.get_mut(&kind)
        {
            stage.deactivate();
        }
        for stage in self.stages.values_mut() {
            stage.dispose();
        }
        self.target = None;
        self.transition = None;
        self.pending_shared = None;
        self.disposed = true;
        info!("Stage manager disposed ({} stage(s))", self.stages.len());
    }
}

impl Drop for StageManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

//=== Tests ===============================================================
