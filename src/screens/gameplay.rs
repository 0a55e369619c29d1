use std::rc::Rc;

use log::{debug, info, warn};

use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, SCREEN_HEIGHT, SCREEN_WIDTH, WHITE, with_alpha};
use crate::core::input::InputCommand;
use crate::game::chart::Chart;
use crate::game::judgment::{self, JudgeGrade, JudgmentCounts};
use crate::game::life::{self, LIFE_START};
use crate::game::stage_stats::{CompletionReason, PerformanceSummary};
use crate::screens::{
    FONT_MENU, FONT_MENU_SIZE, SND_TAP, ScreenSettings, TEX_GAMEPLAY_BG, draw_label, load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType, keys,
};

/* ---------------------------- constants ---------------------------- */

const RECEPTOR_Y: f32 = 80.0;
const SCROLL_PX_PER_SEC: f32 = 300.0;
const LANE_X: f32 = SCREEN_WIDTH * 0.5 - 32.0;
const NOTE_SIZE: f32 = 64.0;
const LIFE_BAR: Rect = Rect::new(20.0, 20.0, 240.0, 16.0);
const JUDGMENT_SHOW_SECS: f32 = 0.8;

pub struct State {
    lead_in: f32,
    fade: StageTransition,
    chart: Rc<Chart>,
    song_id: String,
    autoplay: bool,
    offset: f32,
    /// Song time in seconds; negative during the lead-in.
    clock: f32,
    next_note: usize,
    score: i64,
    combo: u32,
    max_combo: u32,
    counts: JudgmentCounts,
    life: f32,
    last_grade: Option<(JudgeGrade, f32)>,
    finished: Option<CompletionReason>,
    requested: bool,
    background: Option<Handle>,
    font: Option<Handle>,
    tap_sound: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        lead_in: settings.lead_in_seconds,
        fade: settings.fade(),
        chart: Rc::new(Chart::default()),
        song_id: String::new(),
        autoplay: false,
        offset: 0.0,
        clock: 0.0,
        next_note: 0,
        score: 0,
        combo: 0,
        max_combo: 0,
        counts: JudgmentCounts::default(),
        life: LIFE_START,
        last_grade: None,
        finished: None,
        requested: false,
        background: None,
        font: None,
        tap_sound: None,
    }
}

impl State {
    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary {
            score: self.score,
            max_combo: self.max_combo,
            counts: self.counts,
            total_notes: self.chart.note_count() as u32,
            final_life: self.life,
            completion: self.finished.unwrap_or_default(),
        }
    }

    pub fn finished(&self) -> Option<CompletionReason> {
        self.finished
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    /// Song time the judge sees, after the player's global offset.
    #[inline(always)]
    fn music_time(&self) -> f32 {
        self.clock - self.offset
    }

    fn register(&mut self, grade: JudgeGrade) {
        self.counts.record(grade);
        self.score += judgment::grade_points_for(grade);
        if grade.continues_combo() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else {
            self.combo = 0;
        }
        self.life = life::apply(self.life, grade);
        self.last_grade = Some((grade, self.clock));
        self.next_note += 1;
    }

    fn tap(&mut self, ctx: &mut StageContext<'_>) {
        if let Some(sound) = &self.tap_sound {
            ctx.audio.play(sound);
        }
        let Some(&note_time) = self.chart.note_times.get(self.next_note) else {
            return;
        };
        // Taps outside the widest window hit nothing.
        if let Some(grade) = judgment::judge_offset(self.music_time() - note_time) {
            self.register(grade);
        }
    }

    fn judge_pending(&mut self) {
        let now = self.music_time();
        while let Some(&note_time) = self.chart.note_times.get(self.next_note) {
            if self.autoplay && note_time <= now {
                self.register(JudgeGrade::Fantastic);
            } else if now - note_time > judgment::WINDOW_WAY_OFF {
                self.register(JudgeGrade::Miss);
            } else {
                break;
            }
        }
    }

    fn check_finished(&mut self) {
        if self.finished.is_some() {
            return;
        }
        let reason = if self.life <= 0.0 {
            CompletionReason::Failed
        } else if self.next_note >= self.chart.note_count()
            && self.clock >= self.chart.length_seconds
        {
            CompletionReason::Cleared
        } else {
            return;
        };
        info!(
            "'{}' finished: {} with score {} ({} of {} notes judged)",
            self.song_id,
            reason.as_str(),
            self.score,
            self.counts.total(),
            self.chart.note_count()
        );
        self.finished = Some(reason);
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, shared: &SharedData) {
        self.chart = shared.get::<Rc<Chart>>(keys::PARSED_CHART).unwrap_or_else(|| {
            warn!("No chart handed to Performance; playing an empty chart");
            Rc::new(Chart::default())
        });
        self.song_id = shared.get_or(keys::SONG_ID, self.chart.song_id.clone());
        self.autoplay = ctx.options.autoplay;
        self.offset = ctx.options.global_offset_seconds;
        self.clock = -self.lead_in;
        self.next_note = 0;
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.counts = JudgmentCounts::default();
        self.life = LIFE_START;
        self.last_grade = None;
        self.finished = None;
        self.requested = false;

        self.background = load_or_warn(
            ctx.assets.load_texture(TEX_GAMEPLAY_BG),
            StageType::Performance,
        );
        self.font = load_or_warn(
            ctx.assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::Performance,
        );
        self.tap_sound = load_or_warn(ctx.assets.load_sound(SND_TAP), StageType::Performance);
        debug!(
            "Performance of '{}': {} notes, autoplay {}",
            self.song_id,
            self.chart.note_count(),
            self.autoplay
        );
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, dt: f32) -> StageAction {
        if self.finished.is_none() {
            self.clock += dt.max(0.0);
            for cmd in ctx.input.drain() {
                match cmd {
                    InputCommand::Back => {
                        info!("'{}' quit by the player", self.song_id);
                        self.finished = Some(CompletionReason::Quit);
                        break;
                    }
                    InputCommand::Activate if !self.autoplay => self.tap(ctx),
                    _ => {}
                }
            }
            if self.finished.is_none() {
                self.judge_pending();
                self.check_finished();
            }
        } else {
            ctx.input.clear();
        }

        if self.finished.is_none() || self.requested || !ctx.claim_transition() {
            return StageAction::None;
        }
        self.requested = true;
        let shared = SharedData::new()
            .with(keys::PERFORMANCE_SUMMARY, self.summary())
            .with(keys::SONG_ID, self.song_id.as_str());
        StageAction::Change(
            StageRequest::new(StageType::Result)
                .with_transition(self.fade.clone())
                .with_shared(shared),
        )
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        if let Some(bg) = &self.background {
            canvas.sprite(bg.key(), Rect::screen(), with_alpha(WHITE, 0.3));
        }

        canvas.quad(LIFE_BAR, [0.2, 0.2, 0.2, 1.0]);
        canvas.quad(
            Rect::new(LIFE_BAR.x, LIFE_BAR.y, LIFE_BAR.w * self.life, LIFE_BAR.h),
            [0.3, 0.9, 0.4, 1.0],
        );
        canvas.quad(
            Rect::new(LANE_X, RECEPTOR_Y, NOTE_SIZE, NOTE_SIZE),
            with_alpha(WHITE, 0.4),
        );

        let now = self.music_time();
        for &t in &self.chart.note_times[self.next_note.min(self.chart.note_times.len())..] {
            let y = RECEPTOR_Y + (t - now) * SCROLL_PX_PER_SEC;
            if y > SCREEN_HEIGHT {
                break;
            }
            canvas.quad(Rect::new(LANE_X, y, NOTE_SIZE, NOTE_SIZE), [0.9, 0.3, 0.3, 1.0]);
        }

        draw_label(
            canvas,
            self.font.as_ref(),
            &format!("Score {}  Combo {}", self.score, self.combo),
            [SCREEN_WIDTH - 260.0, 20.0],
            WHITE,
        );
        if let Some((grade, at)) = self.last_grade
            && self.clock - at < JUDGMENT_SHOW_SECS
        {
            draw_label(
                canvas,
                self.font.as_ref(),
                grade.label(),
                [SCREEN_WIDTH * 0.5 - 40.0, SCREEN_HEIGHT * 0.5],
                WHITE,
            );
        }
    }

    fn on_deactivate(&mut self) {
        self.background = None;
        self.font = None;
        self.tap_sound = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::chart::Difficulty;
    use crate::screens::test_support::services;
    use crate::stage::StageServices;

    fn chart(note_times: Vec<f32>, length: f32) -> Rc<Chart> {
        Rc::new(Chart {
            song_id: "test-song".to_string(),
            difficulty: Difficulty::Easy,
            meter: 3,
            note_times,
            length_seconds: length,
        })
    }

    fn start(svc: &mut StageServices, chart: Rc<Chart>) -> State {
        let mut screen = init(&ScreenSettings {
            lead_in_seconds: 0.0,
            ..ScreenSettings::default()
        });
        let shared = SharedData::new()
            .with(keys::PARSED_CHART, chart)
            .with(keys::SONG_ID, "test-song");
        screen.on_activate(&mut svc.context(), &shared);
        screen
    }

    fn frame(
        screen: &mut State,
        svc: &mut StageServices,
        dt: f32,
        cmds: &[InputCommand],
    ) -> StageAction {
        svc.gate.begin_frame(dt);
        for &cmd in cmds {
            svc.input.push(cmd);
        }
        screen.on_update(&mut svc.context(), dt)
    }

    #[test]
    fn autoplay_clears_with_all_fantastics_and_requests_result_once() {
        let mut svc = services();
        svc.options.autoplay = true;
        let mut screen = start(&mut svc, chart(vec![0.5, 1.0, 1.5], 2.0));
        let mut changes = Vec::new();
        for _ in 0..12 {
            if let StageAction::Change(req) = frame(&mut screen, &mut svc, 0.25, &[]) {
                changes.push(req);
            }
        }
        assert_eq!(changes.len(), 1, "result requested exactly once");
        let req = changes.pop().expect("change");
        assert_eq!(req.target, StageType::Result);
        let shared = req.shared.expect("payload");
        let summary = shared
            .get::<PerformanceSummary>(keys::PERFORMANCE_SUMMARY)
            .expect("summary");
        assert_eq!(summary.completion, CompletionReason::Cleared);
        assert_eq!(summary.counts.fantastic, 3);
        assert_eq!(summary.max_combo, 3);
        assert_eq!(summary.total_notes, 3);
        assert_eq!(shared.get::<String>(keys::SONG_ID).as_deref(), Some("test-song"));
    }

    #[test]
    fn taps_are_judged_against_the_offset_clock() {
        let mut svc = services();
        svc.options.global_offset_seconds = 0.0;
        let mut screen = start(&mut svc, chart(vec![0.5, 1.0], 4.0));
        frame(&mut screen, &mut svc, 0.5, &[InputCommand::Activate]);
        // 0.125s late on the second note.
        frame(&mut screen, &mut svc, 0.625, &[InputCommand::Activate]);
        let summary = screen.summary();
        assert_eq!(summary.counts.fantastic, 1);
        assert_eq!(summary.counts.decent, 1);
        assert_eq!(summary.max_combo, 1);
        assert_eq!(svc.audio.take_queued(), [SND_TAP, SND_TAP]);
    }

    #[test]
    fn untouched_notes_become_misses_and_drain_life_to_failure() {
        let mut svc = services();
        let notes: Vec<f32> = (1..=10).map(|i| i as f32 * 0.25).collect();
        let mut screen = start(&mut svc, chart(notes, 10.0));
        let mut result = None;
        for _ in 0..20 {
            if let StageAction::Change(req) = frame(&mut screen, &mut svc, 0.25, &[]) {
                result = Some(req);
                break;
            }
        }
        assert_eq!(screen.finished(), Some(CompletionReason::Failed));
        assert_eq!(screen.life(), 0.0);
        let summary = result
            .and_then(|r| r.shared)
            .and_then(|s| s.get::<PerformanceSummary>(keys::PERFORMANCE_SUMMARY))
            .expect("summary");
        let mut life = LIFE_START;
        let mut misses_to_fail = 0;
        while life > 0.0 {
            life = life::apply(life, JudgeGrade::Miss);
            misses_to_fail += 1;
        }
        assert_eq!(summary.counts.miss, misses_to_fail);
        assert_eq!(summary.completion, CompletionReason::Failed);
    }

    #[test]
    fn back_quits_and_missing_chart_plays_empty() {
        let mut svc = services();
        let mut screen = start(&mut svc, chart(vec![5.0], 10.0));
        match frame(&mut screen, &mut svc, 0.1, &[InputCommand::Back]) {
            StageAction::Change(req) => {
                let summary = req
                    .shared
                    .and_then(|s| s.get::<PerformanceSummary>(keys::PERFORMANCE_SUMMARY))
                    .expect("summary");
                assert_eq!(summary.completion, CompletionReason::Quit);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut screen = init(&ScreenSettings {
            lead_in_seconds: 0.0,
            ..ScreenSettings::default()
        });
        screen.on_activate(&mut svc.context(), &SharedData::new());
        assert!(matches!(frame(&mut screen, &mut svc, 0.1, &[]), StageAction::Change(_)));
        assert_eq!(screen.finished(), Some(CompletionReason::Cleared));
        assert_eq!(screen.summary().total_notes, 0);
    }
}
