pub mod evaluation;
pub mod gameplay;
pub mod options;
pub mod select_music;
pub mod song_transition;
pub mod startup;
pub mod title;

use std::path::PathBuf;

use log::warn;

use crate::assets::{AssetError, AssetKind, Handle};
use crate::config::Config;
use crate::core::gfx::{Canvas, Rect};
use crate::stage::{Easing, StageRegistry, StageTransition, StageType};

/* ---------------------------- assets ---------------------------- */

pub const FONT_MENU: &str = "miso";
pub const FONT_MENU_SIZE: f32 = 20.0;
pub const FONT_HEADER: &str = "wendy";
pub const FONT_HEADER_SIZE: f32 = 30.0;

pub const TEX_LOGO: &str = "logo.png";
pub const TEX_SELECT_BG: &str = "select_bg.png";
pub const TEX_GAMEPLAY_BG: &str = "gameplay_bg.png";
pub const TEX_EVALUATION_BG: &str = "evaluation_bg.png";

pub const SND_CHANGE: &str = "change.ogg";
pub const SND_START: &str = "start.ogg";
pub const SND_TAP: &str = "tap.ogg";

/// Everything the stock screens load. Used to seed an in-memory asset
/// source when no asset directory is configured.
pub const BUILTIN_ASSETS: [(AssetKind, &str); 9] = [
    (AssetKind::Font, FONT_MENU),
    (AssetKind::Font, FONT_HEADER),
    (AssetKind::Texture, TEX_LOGO),
    (AssetKind::Texture, TEX_SELECT_BG),
    (AssetKind::Texture, TEX_GAMEPLAY_BG),
    (AssetKind::Texture, TEX_EVALUATION_BG),
    (AssetKind::Sound, SND_CHANGE),
    (AssetKind::Sound, SND_START),
    (AssetKind::Sound, SND_TAP),
];

/* ---------------------------- settings ---------------------------- */

/// The part of the config the screens care about, captured when the
/// registry is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSettings {
    pub fade_duration: f32,
    pub fade_easing: Easing,
    pub startup_hold_seconds: f32,
    pub song_transition_hold_seconds: f32,
    pub lead_in_seconds: f32,
    pub score_log: Option<PathBuf>,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self::from_config(&Config {
            save_scores: false,
            ..Config::default()
        })
    }
}

impl ScreenSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            fade_duration: cfg.fade_duration,
            fade_easing: cfg.fade_easing,
            startup_hold_seconds: cfg.startup_hold_seconds,
            song_transition_hold_seconds: cfg.song_transition_hold_seconds,
            lead_in_seconds: cfg.lead_in_seconds,
            score_log: cfg.score_log_path(),
        }
    }

    pub(crate) fn fade(&self) -> StageTransition {
        StageTransition::fade_eased(self.fade_duration, self.fade_easing)
    }
}

/// Registry with a constructor for every stage type.
pub fn registry(settings: &ScreenSettings) -> StageRegistry {
    let mut reg = StageRegistry::new();
    let s = settings.clone();
    reg.register(StageType::Startup, move || Box::new(startup::init(&s)));
    let s = settings.clone();
    reg.register(StageType::Title, move || Box::new(title::init(&s)));
    reg.register(StageType::Config, || Box::new(options::init()));
    let s = settings.clone();
    reg.register(StageType::SongSelect, move || Box::new(select_music::init(&s)));
    let s = settings.clone();
    reg.register(StageType::SongTransition, move || {
        Box::new(song_transition::init(&s))
    });
    let s = settings.clone();
    reg.register(StageType::Performance, move || Box::new(gameplay::init(&s)));
    let s = settings.clone();
    reg.register(StageType::Result, move || Box::new(evaluation::init(&s)));
    reg
}

/* ---------------------------- helpers ---------------------------- */

/// Keeps the handle on success; logs and degrades to `None` otherwise.
pub(crate) fn load_or_warn(result: Result<Handle, AssetError>, stage: StageType) -> Option<Handle> {
    match result {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("{stage}: {e}; continuing without it");
            None
        }
    }
}

/// Draws `text` with `font`, or a solid bar of roughly the same extent when
/// the font is unavailable.
pub(crate) fn draw_label(
    canvas: &mut dyn Canvas,
    font: Option<&Handle>,
    text: &str,
    pos: [f32; 2],
    color: [f32; 4],
) {
    match font {
        Some(font) => canvas.text(font.key(), text, pos, color),
        None => {
            let w = text.chars().count() as f32 * 8.0;
            canvas.quad(Rect::new(pos[0], pos[1], w, 14.0), color);
        }
    }
}
