use crate::game::chart::{Chart, ChartError, ChartInfo, Difficulty};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct SongInfo {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub bpm: f32,
    pub music_length_seconds: f32,
    pub charts: Vec<ChartInfo>,
}

impl SongInfo {
    pub fn chart_info(&self, difficulty: Difficulty) -> Option<&ChartInfo> {
        self.charts.iter().find(|c| c.difficulty == difficulty)
    }

    /// Closest available difficulty index to `preferred`, searching downward
    /// first so a requested Hard falls back to Medium before Challenge.
    pub fn nearest_difficulty_index(&self, preferred: usize) -> Option<usize> {
        let has = |idx: usize| {
            Difficulty::from_index(idx).is_some_and(|d| self.chart_info(d).is_some())
        };
        let max = Difficulty::ALL.len().saturating_sub(1);
        let preferred = preferred.min(max);
        (0..=preferred)
            .rev()
            .find(|&idx| has(idx))
            .or_else(|| (preferred + 1..=max).find(|&idx| has(idx)))
    }

    // Stand-in for simfile parsing: an evenly spaced stream whose density
    // follows the meter.
    fn build_chart(&self, info: &ChartInfo) -> Chart {
        let beat = 60.0 / self.bpm.max(1.0);
        let step = match info.meter {
            0..=3 => beat * 2.0,
            4..=6 => beat,
            7..=9 => beat * 0.5,
            _ => beat * 0.25,
        };
        let mut note_times = Vec::new();
        let mut t = beat;
        let last = self.music_length_seconds - beat;
        while t <= last {
            note_times.push(t);
            t += step;
        }
        Chart {
            song_id: self.id.clone(),
            difficulty: info.difficulty,
            meter: info.meter,
            note_times,
            length_seconds: self.music_length_seconds,
        }
    }
}

/// Read-only view of the installed songs.
#[derive(Debug, Default)]
pub struct SongLibrary {
    songs: Vec<Rc<SongInfo>>,
}

impl SongLibrary {
    pub fn new(songs: Vec<SongInfo>) -> Self {
        Self {
            songs: songs.into_iter().map(Rc::new).collect(),
        }
    }

    /// Small built-in set used when no song database is attached.
    pub fn demo() -> Self {
        let charts = |meters: &[(Difficulty, u32)]| {
            meters
                .iter()
                .map(|&(difficulty, meter)| ChartInfo { difficulty, meter })
                .collect::<Vec<_>>()
        };
        Self::new(vec![
            SongInfo {
                id: "sunrise-drive".to_string(),
                title: "Sunrise Drive".to_string(),
                artist: "Polar Static".to_string(),
                bpm: 140.0,
                music_length_seconds: 12.0,
                charts: charts(&[
                    (Difficulty::Beginner, 2),
                    (Difficulty::Easy, 4),
                    (Difficulty::Medium, 7),
                ]),
            },
            SongInfo {
                id: "glass-tide".to_string(),
                title: "Glass Tide".to_string(),
                artist: "Minor Orbit".to_string(),
                bpm: 172.0,
                music_length_seconds: 10.0,
                charts: charts(&[
                    (Difficulty::Medium, 8),
                    (Difficulty::Hard, 10),
                    (Difficulty::Challenge, 12),
                ]),
            },
            SongInfo {
                id: "paper-lanterns".to_string(),
                title: "Paper Lanterns".to_string(),
                artist: "Kite Season".to_string(),
                bpm: 96.0,
                music_length_seconds: 14.0,
                charts: charts(&[(Difficulty::Easy, 3), (Difficulty::Hard, 9)]),
            },
        ])
    }

    pub fn songs(&self) -> &[Rc<SongInfo>] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Rc<SongInfo>> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn load_chart(&self, song_id: &str, difficulty_index: usize) -> Result<Chart, ChartError> {
        let song = self
            .find(song_id)
            .ok_or_else(|| ChartError::UnknownSong(song_id.to_string()))?;
        let info = Difficulty::from_index(difficulty_index)
            .and_then(|d| song.chart_info(d))
            .ok_or_else(|| ChartError::NoChart {
                song_id: song_id.to_string(),
                difficulty_index,
            })?;
        Ok(song.build_chart(info))
    }
}
