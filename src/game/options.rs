/// Per-player settings edited on the options screen and read by gameplay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerOptions {
    pub autoplay: bool,
    pub global_offset_seconds: f32,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            autoplay: false,
            global_offset_seconds: -0.008,
        }
    }
}

impl PlayerOptions {
    pub const OFFSET_STEP: f32 = 0.001;
    pub const OFFSET_LIMIT: f32 = 1.0;

    pub fn nudge_offset(&mut self, steps: i32) {
        let next = self.global_offset_seconds + steps as f32 * Self::OFFSET_STEP;
        self.global_offset_seconds = next.clamp(-Self::OFFSET_LIMIT, Self::OFFSET_LIMIT);
    }
}
