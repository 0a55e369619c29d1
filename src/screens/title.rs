use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, SCREEN_WIDTH, WHITE};
use crate::core::input::InputCommand;
use crate::screens::{
    FONT_HEADER, FONT_HEADER_SIZE, FONT_MENU, FONT_MENU_SIZE, SND_CHANGE, SND_START, ScreenSettings,
    TEX_LOGO, draw_label, load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType,
};

/* ---------------------------- constants ---------------------------- */

const MENU_TOP: f32 = 260.0;
const MENU_SPACING: f32 = 32.0;
const SELECTED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Start,
    Options,
    Exit,
}

impl MenuItem {
    pub const ALL: [Self; 3] = [Self::Start, Self::Options, Self::Exit];

    const fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Options => "Options",
            Self::Exit => "Exit",
        }
    }
}

pub struct State {
    fade: StageTransition,
    selected: usize,
    logo: Option<Handle>,
    header: Option<Handle>,
    font: Option<Handle>,
    change_sound: Option<Handle>,
    start_sound: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        fade: settings.fade(),
        selected: 0,
        logo: None,
        header: None,
        font: None,
        change_sound: None,
        start_sound: None,
    }
}

impl State {
    pub fn selected(&self) -> MenuItem {
        MenuItem::ALL[self.selected]
    }

    fn step(&mut self, ctx: &mut StageContext<'_>, delta: isize) {
        let n = MenuItem::ALL.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(n) as usize;
        if let Some(sound) = &self.change_sound {
            ctx.audio.play(sound);
        }
    }

    fn exit(ctx: &mut StageContext<'_>) -> StageAction {
        if ctx.claim_transition() {
            StageAction::Exit
        } else {
            StageAction::None
        }
    }

    fn choose(&mut self, ctx: &mut StageContext<'_>) -> StageAction {
        let item = self.selected();
        if item == MenuItem::Exit {
            return Self::exit(ctx);
        }
        if !ctx.claim_transition() {
            return StageAction::None;
        }
        if let Some(sound) = &self.start_sound {
            ctx.audio.play(sound);
        }
        let request = match item {
            MenuItem::Start => {
                StageRequest::new(StageType::SongSelect).with_transition(self.fade.clone())
            }
            _ => StageRequest::new(StageType::Config).with_transition(StageTransition::instant()),
        };
        StageAction::Change(request)
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, _shared: &SharedData) {
        let assets = &mut *ctx.assets;
        self.logo = load_or_warn(assets.load_texture(TEX_LOGO), StageType::Title);
        self.header = load_or_warn(
            assets.load_font(FONT_HEADER, FONT_HEADER_SIZE),
            StageType::Title,
        );
        self.font = load_or_warn(assets.load_font(FONT_MENU, FONT_MENU_SIZE), StageType::Title);
        self.change_sound = load_or_warn(assets.load_sound(SND_CHANGE), StageType::Title);
        self.start_sound = load_or_warn(assets.load_sound(SND_START), StageType::Title);
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, _dt: f32) -> StageAction {
        for cmd in ctx.input.drain() {
            let action = match cmd {
                InputCommand::Up => {
                    self.step(ctx, -1);
                    StageAction::None
                }
                InputCommand::Down => {
                    self.step(ctx, 1);
                    StageAction::None
                }
                InputCommand::Activate => self.choose(ctx),
                InputCommand::Back => Self::exit(ctx),
                InputCommand::Left | InputCommand::Right => StageAction::None,
            };
            if !matches!(action, StageAction::None) {
                return action;
            }
        }
        StageAction::None
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        let logo_rect = Rect::new(SCREEN_WIDTH * 0.5 - 160.0, 60.0, 320.0, 120.0);
        if let Some(logo) = &self.logo {
            canvas.sprite(logo.key(), logo_rect, WHITE);
        }
        draw_label(
            canvas,
            self.header.as_ref(),
            "STAGEHAND",
            [SCREEN_WIDTH * 0.5 - 80.0, 200.0],
            WHITE,
        );
        for (i, item) in MenuItem::ALL.iter().enumerate() {
            let color = if i == self.selected { SELECTED } else { WHITE };
            draw_label(
                canvas,
                self.font.as_ref(),
                item.label(),
                [SCREEN_WIDTH * 0.5 - 40.0, MENU_TOP + i as f32 * MENU_SPACING],
                color,
            );
        }
    }

    fn on_deactivate(&mut self) {
        self.logo = None;
        self.header = None;
        self.font = None;
        self.change_sound = None;
        self.start_sound = None;
    }
}
