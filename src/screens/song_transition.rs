use std::rc::Rc;

use log::{info, warn};

use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, SCREEN_HEIGHT, SCREEN_WIDTH, WHITE, with_alpha};
use crate::game::chart::{Chart, Difficulty};
use crate::game::song::SongInfo;
use crate::screens::{
    FONT_HEADER, FONT_HEADER_SIZE, FONT_MENU, FONT_MENU_SIZE, ScreenSettings, draw_label,
    load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType, keys,
};

// Swoosh band behind the song title.
const BAND_H: f32 = 90.0;

pub struct State {
    hold: f32,
    fade: StageTransition,
    elapsed: f32,
    song: Option<Rc<SongInfo>>,
    difficulty: usize,
    chart: Option<Rc<Chart>>,
    failed: bool,
    requested: bool,
    header: Option<Handle>,
    font: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        hold: settings.song_transition_hold_seconds,
        fade: settings.fade(),
        elapsed: 0.0,
        song: None,
        difficulty: 0,
        chart: None,
        failed: false,
        requested: false,
        header: None,
        font: None,
    }
}

impl State {
    pub fn chart(&self) -> Option<&Rc<Chart>> {
        self.chart.as_ref()
    }

    fn load_chart(&mut self, ctx: &StageContext<'_>) {
        let Some(song) = &self.song else {
            warn!("Song transition entered without a selected song");
            self.failed = true;
            return;
        };
        match ctx.songs.load_chart(&song.id, self.difficulty) {
            Ok(chart) => {
                info!(
                    "Loaded chart for '{}' ({} notes, {:.1}s)",
                    song.id,
                    chart.note_count(),
                    chart.length_seconds
                );
                self.chart = Some(Rc::new(chart));
            }
            Err(e) => {
                warn!("Failed to load chart: {e}");
                self.failed = true;
            }
        }
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, shared: &SharedData) {
        self.elapsed = 0.0;
        self.requested = false;
        self.failed = false;
        self.chart = None;
        self.song = shared.get::<Rc<SongInfo>>(keys::SELECTED_SONG);
        self.difficulty = shared.get_or(keys::SELECTED_DIFFICULTY, 0usize);
        self.header = load_or_warn(
            ctx.assets.load_font(FONT_HEADER, FONT_HEADER_SIZE),
            StageType::SongTransition,
        );
        self.font = load_or_warn(
            ctx.assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::SongTransition,
        );
    }

    fn on_first_update(&mut self, ctx: &mut StageContext<'_>) {
        self.load_chart(ctx);
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, dt: f32) -> StageAction {
        self.elapsed += dt.max(0.0);
        // Input is not accepted while the chart is being prepared.
        ctx.input.clear();

        if self.requested {
            return StageAction::None;
        }
        if self.failed {
            if !ctx.claim_transition() {
                return StageAction::None;
            }
            self.requested = true;
            return StageAction::Change(
                StageRequest::new(StageType::SongSelect).with_transition(self.fade.clone()),
            );
        }
        let Some(chart) = &self.chart else {
            return StageAction::None;
        };
        if self.elapsed < self.hold || !ctx.claim_transition() {
            return StageAction::None;
        }
        self.requested = true;
        let shared = SharedData::new()
            .with(keys::PARSED_CHART, Rc::clone(chart))
            .with(keys::SONG_ID, chart.song_id.as_str());
        StageAction::Change(
            StageRequest::new(StageType::Performance)
                .with_transition(StageTransition::instant())
                .with_shared(shared),
        )
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        let t = if self.hold > 0.0 {
            (self.elapsed / self.hold).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let band = Rect::new(0.0, (SCREEN_HEIGHT - BAND_H) * 0.5, SCREEN_WIDTH * t, BAND_H);
        canvas.quad(band, with_alpha([0.1, 0.1, 0.2, 1.0], 0.9));

        let Some(song) = &self.song else {
            return;
        };
        draw_label(
            canvas,
            self.header.as_ref(),
            &song.title,
            [60.0, SCREEN_HEIGHT * 0.5 - 30.0],
            WHITE,
        );
        let diff = Difficulty::from_index(self.difficulty).map_or("?", Difficulty::name);
        draw_label(
            canvas,
            self.font.as_ref(),
            &format!("{} / {diff}", song.artist),
            [60.0, SCREEN_HEIGHT * 0.5 + 10.0],
            WHITE,
        );
    }

    fn on_deactivate(&mut self) {
        self.song = None;
        self.chart = None;
        self.header = None;
        self.font = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::test_support::services;
    use crate::stage::StageServices;

    fn settings() -> ScreenSettings {
        ScreenSettings {
            song_transition_hold_seconds: 0.5,
            ..ScreenSettings::default()
        }
    }

    fn run(screen: &mut State, svc: &mut StageServices, frames: usize) -> Vec<StageAction> {
        let mut actions = Vec::new();
        for i in 0..frames {
            svc.gate.begin_frame(0.25);
            if i == 0 {
                screen.on_first_update(&mut svc.context());
            }
            actions.push(screen.on_update(&mut svc.context(), 0.25));
        }
        actions
    }

    #[test]
    fn loads_the_chart_and_hands_it_to_performance_after_the_hold() {
        let mut svc = services();
        let song = svc.songs.find("glass-tide").cloned().expect("demo song");
        let mut screen = init(&settings());
        let shared = SharedData::new()
            .with(keys::SELECTED_SONG, song)
            .with(keys::SELECTED_DIFFICULTY, Difficulty::Hard.index());
        screen.on_activate(&mut svc.context(), &shared);

        let actions = run(&mut screen, &mut svc, 3);
        assert!(matches!(actions[0], StageAction::None));
        let StageAction::Change(req) = &actions[1] else {
            panic!("expected change after the hold, got {:?}", actions[1]);
        };
        assert_eq!(req.target, StageType::Performance);
        let shared = req.shared.as_ref().expect("payload");
        let chart = shared.get::<Rc<Chart>>(keys::PARSED_CHART).expect("chart");
        assert_eq!(chart.difficulty, Difficulty::Hard);
        assert!(!chart.is_empty());
        assert!(matches!(actions[2], StageAction::None), "requested once");
    }

    #[test]
    fn missing_song_or_chart_goes_back_to_song_select() {
        let mut svc = services();
        let song = svc.songs.find("glass-tide").cloned().expect("demo song");
        for shared in [
            SharedData::new(),
            // glass-tide has no Beginner chart.
            SharedData::new()
                .with(keys::SELECTED_SONG, song)
                .with(keys::SELECTED_DIFFICULTY, Difficulty::Beginner.index()),
        ] {
            let mut screen = init(&settings());
            screen.on_activate(&mut svc.context(), &shared);
            let actions = run(&mut screen, &mut svc, 1);
            match &actions[0] {
                StageAction::Change(req) => assert_eq!(req.target, StageType::SongSelect),
                other => panic!("unexpected {other:?}"),
            }
            assert!(screen.chart().is_none());
        }
    }
}
