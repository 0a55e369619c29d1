use crate::assets::Handle;
use crate::core::gfx::{Canvas, Rect, SCREEN_HEIGHT, SCREEN_WIDTH, WHITE, with_alpha};
use crate::core::input::InputCommand;
use crate::screens::{
    FONT_MENU, FONT_MENU_SIZE, ScreenSettings, TEX_LOGO, draw_label, load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType,
};

/* ---------------------------- constants ---------------------------- */

const LOGO_W: f32 = 320.0;
const LOGO_H: f32 = 120.0;

pub struct State {
    hold: f32,
    elapsed: f32,
    requested: bool,
    logo: Option<Handle>,
    font: Option<Handle>,
}

pub fn init(settings: &ScreenSettings) -> State {
    State {
        hold: settings.startup_hold_seconds,
        elapsed: 0.0,
        requested: false,
        logo: None,
        font: None,
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, _shared: &SharedData) {
        self.elapsed = 0.0;
        self.requested = false;
        self.logo = load_or_warn(ctx.assets.load_texture(TEX_LOGO), StageType::Startup);
        self.font = load_or_warn(
            ctx.assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::Startup,
        );
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, dt: f32) -> StageAction {
        self.elapsed += dt.max(0.0);
        // Start skips the rest of the hold.
        let skip = ctx.input.drain().contains(&InputCommand::Activate);
        if self.requested || !(skip || self.elapsed >= self.hold) {
            return StageAction::None;
        }
        if !ctx.claim_transition() {
            return StageAction::None;
        }
        self.requested = true;
        StageAction::Change(
            StageRequest::new(StageType::Title).with_transition(StageTransition::instant()),
        )
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        let rect = Rect::new(
            (SCREEN_WIDTH - LOGO_W) * 0.5,
            (SCREEN_HEIGHT - LOGO_H) * 0.5 - 40.0,
            LOGO_W,
            LOGO_H,
        );
        let alpha = if self.hold > 0.0 {
            (self.elapsed / self.hold).clamp(0.0, 1.0)
        } else {
            1.0
        };
        match &self.logo {
            Some(logo) => canvas.sprite(logo.key(), rect, with_alpha(WHITE, alpha)),
            None => canvas.quad(rect, with_alpha(WHITE, alpha)),
        }
        draw_label(
            canvas,
            self.font.as_ref(),
            "Loading...",
            [SCREEN_WIDTH * 0.5 - 40.0, SCREEN_HEIGHT - 60.0],
            WHITE,
        );
    }

    fn on_deactivate(&mut self) {
        self.logo = None;
        self.font = None;
    }
}
