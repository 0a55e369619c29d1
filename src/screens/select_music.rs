use std::rc::Rc;

use log::{debug, warn};

use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, SCREEN_HEIGHT, SCREEN_WIDTH, WHITE, with_alpha};
use crate::core::input::InputCommand;
use crate::game::chart::Difficulty;
use crate::game::song::{SongInfo, SongLibrary};
use crate::screens::{
    FONT_HEADER, FONT_HEADER_SIZE, FONT_MENU, FONT_MENU_SIZE, SND_CHANGE, SND_START,
    ScreenSettings, TEX_SELECT_BG, draw_label, load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType, keys,
};

/* ---------------------------- constants ---------------------------- */

const LIST_TOP: f32 = 110.0;
const ROW_H: f32 = 34.0;
const SELECTED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
const DIFF_COLORS: [[f32; 4]; 5] = [
    [0.20, 0.75, 0.95, 1.0],
    [0.35, 0.85, 0.35, 1.0],
    [0.95, 0.80, 0.20, 1.0],
    [0.95, 0.35, 0.30, 1.0],
    [0.70, 0.40, 0.95, 1.0],
];

pub struct State {
    fade: StageTransition,
    /// Snapshot of the library taken at activation.
    songs: Vec<Rc<SongInfo>>,
    song_index: usize,
    /// Difficulty the player last picked; kept across visits.
    preferred_difficulty: usize,
    difficulty: Option<usize>,
    background: Option<Handle>,
    header: Option<Handle>,
    font: Option<Handle>,
    change_sound: Option<Handle>,
    start_sound: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        fade: settings.fade(),
        songs: Vec::new(),
        song_index: 0,
        preferred_difficulty: Difficulty::Medium.index(),
        difficulty: None,
        background: None,
        header: None,
        font: None,
        change_sound: None,
        start_sound: None,
    }
}

impl State {
    pub fn selected_song(&self) -> Option<&Rc<SongInfo>> {
        self.songs.get(self.song_index)
    }

    pub fn selected_difficulty(&self) -> Option<usize> {
        self.difficulty
    }

    fn refresh_difficulty(&mut self) {
        self.difficulty = self
            .selected_song()
            .and_then(|song| song.nearest_difficulty_index(self.preferred_difficulty));
    }

    fn play(&self, ctx: &mut StageContext<'_>, sound: Option<&Handle>) {
        if let Some(sound) = sound {
            ctx.audio.play(sound);
        }
    }

    fn move_song(&mut self, ctx: &mut StageContext<'_>, delta: isize) {
        let n = self.songs.len() as isize;
        if n == 0 {
            return;
        }
        self.song_index = (self.song_index as isize + delta).rem_euclid(n) as usize;
        self.refresh_difficulty();
        self.play(ctx, self.change_sound.as_ref());
    }

    fn move_difficulty(&mut self, ctx: &mut StageContext<'_>, dir: isize) {
        let (Some(song), Some(current)) = (self.selected_song(), self.difficulty) else {
            return;
        };
        let available = |idx: &usize| {
            Difficulty::from_index(*idx).is_some_and(|d| song.chart_info(d).is_some())
        };
        let next = if dir < 0 {
            (0..current).rev().find(available)
        } else {
            (current + 1..Difficulty::ALL.len()).find(available)
        };
        // Clamped at either end of the song's charts.
        if let Some(next) = next {
            self.difficulty = Some(next);
            self.preferred_difficulty = next;
            self.play(ctx, self.change_sound.as_ref());
        }
    }

    fn confirm(&mut self, ctx: &mut StageContext<'_>) -> StageAction {
        let (Some(song), Some(difficulty)) = (self.selected_song().cloned(), self.difficulty)
        else {
            warn!("Nothing to play: no song or chart selected");
            return StageAction::None;
        };
        if !ctx.claim_transition() {
            return StageAction::None;
        }
        debug!("Selected '{}' difficulty {difficulty}", song.id);
        self.play(ctx, self.start_sound.as_ref());
        let shared = SharedData::new()
            .with(keys::SONG_ID, song.id.as_str())
            .with(keys::SELECTED_DIFFICULTY, difficulty)
            .with(keys::SELECTED_SONG, song);
        StageAction::Change(
            StageRequest::new(StageType::SongTransition)
                .with_transition(self.fade.clone())
                .with_shared(shared),
        )
    }

    fn restore_selection(&mut self, library: &SongLibrary, shared: &SharedData) {
        self.songs = library.songs().to_vec();
        if let Some(id) = shared.get::<String>(keys::SONG_ID)
            && let Some(idx) = self.songs.iter().position(|s| s.id == id)
        {
            self.song_index = idx;
        }
        if self.song_index >= self.songs.len() {
            self.song_index = 0;
        }
        self.refresh_difficulty();
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, shared: &SharedData) {
        self.restore_selection(ctx.songs, shared);
        if self.songs.is_empty() {
            warn!("Song library is empty");
        }
        let assets = &mut *ctx.assets;
        self.background = load_or_warn(assets.load_texture(TEX_SELECT_BG), StageType::SongSelect);
        self.header = load_or_warn(
            assets.load_font(FONT_HEADER, FONT_HEADER_SIZE),
            StageType::SongSelect,
        );
        self.font = load_or_warn(
            assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::SongSelect,
        );
        self.change_sound = load_or_warn(assets.load_sound(SND_CHANGE), StageType::SongSelect);
        self.start_sound = load_or_warn(assets.load_sound(SND_START), StageType::SongSelect);
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, _dt: f32) -> StageAction {
        for cmd in ctx.input.drain() {
            match cmd {
                InputCommand::Up => self.move_song(ctx, -1),
                InputCommand::Down => self.move_song(ctx, 1),
                InputCommand::Left => self.move_difficulty(ctx, -1),
                InputCommand::Right => self.move_difficulty(ctx, 1),
                InputCommand::Activate => {
                    let action = self.confirm(ctx);
                    if !matches!(action, StageAction::None) {
                        return action;
                    }
                }
                InputCommand::Back => {
                    if ctx.claim_transition() {
                        return StageAction::Change(
                            StageRequest::new(StageType::Title).with_transition(self.fade.clone()),
                        );
                    }
                }
            }
        }
        StageAction::None
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        if let Some(bg) = &self.background {
            canvas.sprite(bg.key(), Rect::screen(), with_alpha(WHITE, 0.6));
        }
        draw_label(canvas, self.header.as_ref(), "Select Music", [40.0, 40.0], WHITE);

        for (i, song) in self.songs.iter().enumerate() {
            let y = LIST_TOP + i as f32 * ROW_H;
            if y > SCREEN_HEIGHT - 80.0 {
                break;
            }
            let color = if i == self.song_index { SELECTED } else { WHITE };
            let text = format!("{} - {}", song.title, song.artist);
            draw_label(canvas, self.font.as_ref(), &text, [60.0, y], color);
        }

        let Some(song) = self.selected_song() else {
            draw_label(canvas, self.font.as_ref(), "No songs installed", [60.0, LIST_TOP], WHITE);
            return;
        };
        for info in &song.charts {
            let idx = info.difficulty.index();
            let x = SCREEN_WIDTH - 300.0 + idx as f32 * 52.0;
            let rect = Rect::new(x, SCREEN_HEIGHT - 70.0, 44.0, 44.0);
            let alpha = if Some(idx) == self.difficulty { 1.0 } else { 0.35 };
            canvas.quad(rect, with_alpha(DIFF_COLORS[idx], alpha));
        }
        if let Some(info) = self
            .difficulty
            .and_then(Difficulty::from_index)
            .and_then(|d| song.chart_info(d))
        {
            let text = format!("{} {}", info.difficulty.name(), info.meter);
            draw_label(
                canvas,
                self.font.as_ref(),
                &text,
                [SCREEN_WIDTH - 300.0, SCREEN_HEIGHT - 100.0],
                WHITE,
            );
        }
    }

    fn on_deactivate(&mut self) {
        self.background = None;
        self.header = None;
        self.font = None;
        self.change_sound = None;
        self.start_sound = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::test_support::services;
    use crate::stage::StageServices;

    fn activated(svc: &mut StageServices, shared: SharedData) -> State {
        let mut screen = init(&ScreenSettings::default());
        screen.on_activate(&mut svc.context(), &shared);
        screen
    }

    fn feed(screen: &mut State, svc: &mut StageServices, cmds: &[InputCommand]) -> StageAction {
        svc.gate.begin_frame(1.0);
        for &cmd in cmds {
            svc.input.push(cmd);
        }
        screen.on_update(&mut svc.context(), 0.016)
    }

    #[test]
    fn confirm_hands_song_and_difficulty_to_the_transition() {
        let mut svc = services();
        let mut screen = activated(&mut svc, SharedData::new());
        match feed(&mut screen, &mut svc, &[InputCommand::Down, InputCommand::Activate]) {
            StageAction::Change(req) => {
                assert_eq!(req.target, StageType::SongTransition);
                let shared = req.shared.expect("payload");
                let song = shared.get::<Rc<SongInfo>>(keys::SELECTED_SONG).expect("song");
                assert_eq!(song.id, "glass-tide");
                assert_eq!(shared.get::<String>(keys::SONG_ID).as_deref(), Some("glass-tide"));
                assert_eq!(
                    shared.get::<usize>(keys::SELECTED_DIFFICULTY),
                    Some(Difficulty::Medium.index())
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn difficulty_is_clamped_and_remembered() {
        let mut svc = services();
        let mut screen = activated(&mut svc, SharedData::new());
        // sunrise-drive: Beginner, Easy, Medium.
        feed(&mut screen, &mut svc, &[InputCommand::Right, InputCommand::Right]);
        assert_eq!(screen.selected_difficulty(), Some(Difficulty::Medium.index()));
        feed(&mut screen, &mut svc, &[InputCommand::Left, InputCommand::Left, InputCommand::Left]);
        assert_eq!(screen.selected_difficulty(), Some(Difficulty::Beginner.index()));

        // paper-lanterns has no Beginner; nearest is Easy.
        feed(&mut screen, &mut svc, &[InputCommand::Up]);
        assert_eq!(screen.selected_song().map(|s| s.id.as_str()), Some("paper-lanterns"));
        assert_eq!(screen.selected_difficulty(), Some(Difficulty::Easy.index()));
    }

    #[test]
    fn returning_with_a_song_id_restores_the_cursor() {
        let mut svc = services();
        let screen = activated(
            &mut svc,
            SharedData::new().with(keys::SONG_ID, "paper-lanterns"),
        );
        assert_eq!(screen.selected_song().map(|s| s.id.as_str()), Some("paper-lanterns"));
    }

    #[test]
    fn empty_library_cannot_confirm() {
        let mut svc = services();
        svc.songs = SongLibrary::default();
        let mut screen = activated(&mut svc, SharedData::new());
        assert!(matches!(
            feed(&mut screen, &mut svc, &[InputCommand::Down, InputCommand::Activate]),
            StageAction::None
        ));
        match feed(&mut screen, &mut svc, &[InputCommand::Back]) {
            StageAction::Change(req) => assert_eq!(req.target, StageType::Title),
            other => panic!("unexpected {other:?}"),
        }
    }
}
