use std::path::PathBuf;

use log::{debug, warn};

use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, WHITE, with_alpha};
use crate::core::input::InputCommand;
use crate::game::judgment::JudgeGrade;
use crate::game::scores::{self, ScoreRecord};
use crate::game::stage_stats::{CompletionReason, PerformanceSummary};
use crate::screens::{
    FONT_HEADER, FONT_HEADER_SIZE, FONT_MENU, FONT_MENU_SIZE, ScreenSettings, TEX_EVALUATION_BG,
    draw_label, load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType, keys,
};

/* ---------------------------- constants ---------------------------- */

const UNKNOWN_SONG: &str = "unknown";
const PANEL: Rect = Rect::new(40.0, 100.0, 380.0, 300.0);
const ROW_H: f32 = 30.0;

pub struct State {
    fade: StageTransition,
    score_log: Option<PathBuf>,
    summary: PerformanceSummary,
    song_id: String,
    saved: bool,
    requested: bool,
    background: Option<Handle>,
    header: Option<Handle>,
    font: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        fade: settings.fade(),
        score_log: settings.score_log.clone(),
        summary: PerformanceSummary::default(),
        song_id: UNKNOWN_SONG.to_string(),
        saved: false,
        requested: false,
        background: None,
        header: None,
        font: None,
    }
}

impl State {
    pub fn summary(&self) -> &PerformanceSummary {
        &self.summary
    }

    pub fn song_id(&self) -> &str {
        &self.song_id
    }

    /// Whether this visit's score made it into the score log.
    pub fn saved(&self) -> bool {
        self.saved
    }

    fn save_score(&mut self) {
        let Some(path) = &self.score_log else {
            return;
        };
        if self.summary.completion == CompletionReason::Unknown {
            debug!("Not recording a play with no completion reason");
            return;
        }
        let record = ScoreRecord::now(&self.song_id, self.summary.clone());
        match scores::append_record(path, &record) {
            Ok(()) => self.saved = true,
            Err(e) => warn!("Failed to record score in {path:?}: {e}"),
        }
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, shared: &SharedData) {
        self.summary = shared
            .get::<PerformanceSummary>(keys::PERFORMANCE_SUMMARY)
            .unwrap_or_default();
        self.song_id = shared.get_or(keys::SONG_ID, UNKNOWN_SONG.to_string());
        self.saved = false;
        self.requested = false;
        self.save_score();

        self.background = load_or_warn(
            ctx.assets.load_texture(TEX_EVALUATION_BG),
            StageType::Result,
        );
        self.header = load_or_warn(
            ctx.assets.load_font(FONT_HEADER, FONT_HEADER_SIZE),
            StageType::Result,
        );
        self.font = load_or_warn(
            ctx.assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::Result,
        );
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, _dt: f32) -> StageAction {
        let leave = ctx
            .input
            .drain()
            .iter()
            .any(|cmd| matches!(cmd, InputCommand::Activate | InputCommand::Back));
        if !leave || self.requested || !ctx.claim_transition() {
            return StageAction::None;
        }
        self.requested = true;
        StageAction::Change(
            StageRequest::new(StageType::SongSelect)
                .with_transition(self.fade.clone())
                .with_shared(SharedData::new().with(keys::SONG_ID, self.song_id.as_str())),
        )
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        if let Some(bg) = &self.background {
            canvas.sprite(bg.key(), Rect::screen(), with_alpha(WHITE, 0.5));
        }
        canvas.quad(PANEL, [0.0, 0.0, 0.0, 0.6]);

        let s = &self.summary;
        draw_label(canvas, self.header.as_ref(), &self.song_id, [40.0, 40.0], WHITE);
        let mut lines = vec![
            format!("{:.2}%", s.score_percent()),
            format!("Result: {}", s.completion.as_str()),
            format!("Max combo: {}", s.max_combo),
        ];
        lines.extend(
            JudgeGrade::ALL
                .iter()
                .map(|g| format!("{}: {}", g.label(), s.counts.get(*g))),
        );
        for (i, line) in lines.iter().enumerate() {
            draw_label(
                canvas,
                self.font.as_ref(),
                line,
                [PANEL.x + 20.0, PANEL.y + 10.0 + i as f32 * ROW_H],
                WHITE,
            );
        }
    }

    fn on_deactivate(&mut self) {
        self.background = None;
        self.header = None;
        self.font = None;
    }
}
