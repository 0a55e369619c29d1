use crate::assets::Handle;
use crate::core::gfx::{Canvas, WHITE};
use crate::core::input::InputCommand;
use crate::game::options::PlayerOptions;
use crate::screens::{
    FONT_HEADER, FONT_HEADER_SIZE, FONT_MENU, FONT_MENU_SIZE, SND_CHANGE, draw_label,
    load_or_warn,
};
use crate::stage::{
    Screen, SharedData, StageAction, StageContext, StageRequest, StageTransition, StageType,
};

const ROW_TOP: f32 = 140.0;
const ROW_SPACING: f32 = 36.0;
const SELECTED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Autoplay,
    GlobalOffset,
    Back,
}

impl Row {
    pub const ALL: [Self; 3] = [Self::Autoplay, Self::GlobalOffset, Self::Back];
}

pub struct State {
    row: usize,
    // Snapshot of the live options for drawing.
    shown: PlayerOptions,
    header: Option<Handle>,
    font: Option<Handle>,
    change_sound: Option<Handle>,
}

pub fn init() -> State {
    State {
        row: 0,
        shown: PlayerOptions::default(),
        header: None,
        font: None,
        change_sound: None,
    }
}

fn row_text(row: Row, opts: &PlayerOptions) -> String {
    match row {
        Row::Autoplay => format!("Autoplay: {}", if opts.autoplay { "On" } else { "Off" }),
        Row::GlobalOffset => format!(
            "Global offset: {:+.0} ms",
            opts.global_offset_seconds * 1000.0
        ),
        Row::Back => "Back".to_string(),
    }
}

impl State {
    pub fn row(&self) -> Row {
        Row::ALL[self.row]
    }

    fn back() -> StageAction {
        StageAction::Change(
            StageRequest::new(StageType::Title).with_transition(StageTransition::instant()),
        )
    }

    fn adjust(&mut self, ctx: &mut StageContext<'_>, dir: i32) {
        match self.row() {
            Row::Autoplay => ctx.options.autoplay = !ctx.options.autoplay,
            Row::GlobalOffset => ctx.options.nudge_offset(dir),
            Row::Back => return,
        }
        if let Some(sound) = &self.change_sound {
            ctx.audio.play(sound);
        }
    }
}

impl Screen for State {
    fn on_activate(&mut self, ctx: &mut StageContext<'_>, _shared: &SharedData) {
        self.row = 0;
        self.shown = *ctx.options;
        self.header = load_or_warn(
            ctx.assets.load_font(FONT_HEADER, FONT_HEADER_SIZE),
            StageType::Config,
        );
        self.font = load_or_warn(
            ctx.assets.load_font(FONT_MENU, FONT_MENU_SIZE),
            StageType::Config,
        );
        self.change_sound = load_or_warn(ctx.assets.load_sound(SND_CHANGE), StageType::Config);
    }

    fn on_update(&mut self, ctx: &mut StageContext<'_>, _dt: f32) -> StageAction {
        let n = Row::ALL.len();
        let mut action = StageAction::None;
        for cmd in ctx.input.drain() {
            match cmd {
                InputCommand::Up => self.row = (self.row + n - 1) % n,
                InputCommand::Down => self.row = (self.row + 1) % n,
                InputCommand::Left => self.adjust(ctx, -1),
                InputCommand::Right => self.adjust(ctx, 1),
                InputCommand::Activate if self.row() != Row::Back => self.adjust(ctx, 1),
                InputCommand::Activate | InputCommand::Back => {
                    if ctx.claim_transition() {
                        action = Self::back();
                        break;
                    }
                }
            }
        }
        self.shown = *ctx.options;
        action
    }

    fn on_draw(&self, canvas: &mut dyn Canvas, _dt: f32) {
        draw_label(canvas, self.header.as_ref(), "Options", [60.0, 60.0], WHITE);
        for (i, row) in Row::ALL.iter().enumerate() {
            let color = if i == self.row { SELECTED } else { WHITE };
            draw_label(
                canvas,
                self.font.as_ref(),
                &row_text(*row, &self.shown),
                [80.0, ROW_TOP + i as f32 * ROW_SPACING],
                color,
            );
        }
    }

    fn on_deactivate(&mut self) {
        self.header = None;
        self.font = None;
        self.change_sound = None;
    }
}
