use std::fmt;

pub const FILE_DIFFICULTY_NAMES: [&str; 5] = ["Beginner", "Easy", "Medium", "Hard", "Challenge"];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    #[default]
    Beginner,
    Easy,
    Medium,
    Hard,
    Challenge,
}

impl Difficulty {
    pub const ALL: [Self; 5] = [
        Self::Beginner,
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Challenge,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn name(self) -> &'static str {
        FILE_DIFFICULTY_NAMES[self as usize]
    }
}

/// Per-difficulty metadata listed by the song wheel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartInfo {
    pub difficulty: Difficulty,
    pub meter: u32,
}

/// A chart ready for play: tap times in seconds from the start of the music.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chart {
    pub song_id: String,
    pub difficulty: Difficulty,
    pub meter: u32,
    pub note_times: Vec<f32>,
    pub length_seconds: f32,
}

impl Chart {
    #[inline(always)]
    pub fn note_count(&self) -> usize {
        self.note_times.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.note_times.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    UnknownSong(String),
    NoChart { song_id: String, difficulty_index: usize },
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSong(id) => write!(f, "no song with id '{id}'"),
            Self::NoChart {
                song_id,
                difficulty_index,
            } => {
                let name = FILE_DIFFICULTY_NAMES
                    .get(*difficulty_index)
                    .copied()
                    .unwrap_or("?");
                write!(f, "song '{song_id}' has no {name} chart")
            }
        }
    }
}

impl std::error::Error for ChartError {}
