// Logical screen size; the renderer scales this to the window.
pub const SCREEN_WIDTH: f32 = 854.0;
pub const SCREEN_HEIGHT: f32 = 480.0;

pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn screen() -> Self {
        Self::new(0.0, 0.0, SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

#[inline(always)]
pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Draw sink handed to stages. The real renderer and the recording
/// `RenderList` both implement it.
pub trait Canvas {
    fn quad(&mut self, rect: Rect, color: [f32; 4]);
    fn sprite(&mut self, texture_key: &str, rect: Rect, tint: [f32; 4]);
    fn text(&mut self, font_key: &str, text: &str, pos: [f32; 2], color: [f32; 4]);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    Quad {
        rect: Rect,
        color: [f32; 4],
    },
    Sprite {
        texture_key: String,
        rect: Rect,
        tint: [f32; 4],
    },
    Text {
        font_key: String,
        text: String,
        pos: [f32; 2],
        color: [f32; 4],
    },
}

/// One frame's worth of draw commands, in submission order.
#[derive(Clone, Debug, Default)]
pub struct RenderList {
    pub clear_color: [f32; 4],
    pub commands: Vec<DrawCmd>,
}

impl RenderList {
    pub fn new() -> Self {
        Self {
            clear_color: [0.03, 0.03, 0.03, 1.0],
            commands: Vec::with_capacity(64),
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every string drawn this frame, for assertions and debug overlays.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

impl Canvas for RenderList {
    fn quad(&mut self, rect: Rect, color: [f32; 4]) {
        self.commands.push(DrawCmd::Quad { rect, color });
    }

    fn sprite(&mut self, texture_key: &str, rect: Rect, tint: [f32; 4]) {
        self.commands.push(DrawCmd::Sprite {
            texture_key: texture_key.to_string(),
            rect,
            tint,
        });
    }

    fn text(&mut self, font_key: &str, text: &str, pos: [f32; 2], color: [f32; 4]) {
        self.commands.push(DrawCmd::Text {
            font_key: font_key.to_string(),
            text: text.to_string(),
            pos,
            color,
        });
    }
}
