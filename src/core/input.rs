use smallvec::SmallVec;
use std::collections::VecDeque;
use std::str::FromStr;

/// Device-independent menu/gameplay commands. Key and pad mapping happens
/// before commands reach the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputCommand {
    Up,
    Down,
    Left,
    Right,
    Activate,
    Back,
}

impl FromStr for InputCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "activate" | "start" | "enter" => Ok(Self::Activate),
            "back" | "escape" => Ok(Self::Back),
            _ => Err(()),
        }
    }
}

/// Commands gathered since the last frame, drained by the current stage.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<InputCommand>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: InputCommand) {
        self.pending.push_back(cmd);
    }

    pub fn pop(&mut self) -> Option<InputCommand> {
        self.pending.pop_front()
    }

    /// Dequeues until empty.
    pub fn drain(&mut self) -> SmallVec<[InputCommand; 8]> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
