use log::warn;
use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::game::chart::Chart;
use crate::game::song::SongInfo;
use crate::game::stage_stats::PerformanceSummary;

/// Keys exchanged between stages.
pub mod keys {
    /// `Song`: the song picked on song select.
    pub const SELECTED_SONG: &str = "selectedSong";
    /// `Int`: difficulty index into `FILE_DIFFICULTY_NAMES`.
    pub const SELECTED_DIFFICULTY: &str = "selectedDifficulty";
    /// `Text`: id of the song being played or evaluated.
    pub const SONG_ID: &str = "songId";
    /// `Summary`: result of the finished play.
    pub const PERFORMANCE_SUMMARY: &str = "performanceSummary";
    /// `Chart`: chart loaded by the song transition.
    pub const PARSED_CHART: &str = "parsedChart";
}

#[derive(Clone, Debug)]
pub enum SharedValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Song(Rc<SongInfo>),
    Chart(Rc<Chart>),
    Summary(PerformanceSummary),
}

impl SharedValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Bool(_) => "Bool",
            Self::Text(_) => "Text",
            Self::Song(_) => "Song",
            Self::Chart(_) => "Chart",
            Self::Summary(_) => "Summary",
        }
    }
}

impl From<i64> for SharedValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for SharedValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SharedValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for SharedValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for SharedValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SharedValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Rc<SongInfo>> for SharedValue {
    fn from(v: Rc<SongInfo>) -> Self {
        Self::Song(v)
    }
}

impl From<Rc<Chart>> for SharedValue {
    fn from(v: Rc<Chart>) -> Self {
        Self::Chart(v)
    }
}

impl From<Chart> for SharedValue {
    fn from(v: Chart) -> Self {
        Self::Chart(Rc::new(v))
    }
}

impl From<PerformanceSummary> for SharedValue {
    fn from(v: PerformanceSummary) -> Self {
        Self::Summary(v)
    }
}

/// Typed view of a `SharedValue`. `None` means "wrong type".
pub trait FromShared: Sized {
    fn from_shared(value: &SharedValue) -> Option<Self>;
}

impl FromShared for i64 {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromShared for usize {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Int(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromShared for f64 {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Float(v) => Some(*v),
            SharedValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromShared for bool {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromShared for String {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromShared for Rc<SongInfo> {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Song(v) => Some(Rc::clone(v)),
            _ => None,
        }
    }
}

impl FromShared for Rc<Chart> {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Chart(v) => Some(Rc::clone(v)),
            _ => None,
        }
    }
}

impl FromShared for PerformanceSummary {
    fn from_shared(value: &SharedValue) -> Option<Self> {
        match value {
            SharedValue::Summary(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// One-shot key/value payload handed from the outgoing stage to the
/// incoming one. Readers never fail: a missing key or a value of the wrong
/// type yields `None` (or the caller's default).
#[derive(Clone, Debug, Default)]
pub struct SharedData {
    values: FxHashMap<String, SharedValue>,
}

impl SharedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<SharedValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<SharedValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get<T: FromShared>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        let typed = T::from_shared(value);
        if typed.is_none() {
            warn!(
                "Shared data '{key}' holds {}, not {}",
                value.type_name(),
                std::any::type_name::<T>()
            );
        }
        typed
    }

    pub fn get_or<T: FromShared>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stage_stats::CompletionReason;

    #[test]
    fn typed_reads_degrade_on_mismatch() {
        let data = SharedData::new()
            .with(keys::SELECTED_DIFFICULTY, 3usize)
            .with(keys::SONG_ID, "glass-tide")
            .with(keys::PERFORMANCE_SUMMARY, "not a summary");

        assert_eq!(data.get::<usize>(keys::SELECTED_DIFFICULTY), Some(3));
        assert_eq!(data.get::<String>(keys::SONG_ID).as_deref(), Some("glass-tide"));
        assert_eq!(data.get::<bool>(keys::SONG_ID), None, "wrong type reads as None");
        assert_eq!(
            data.get_or(keys::PERFORMANCE_SUMMARY, PerformanceSummary::default()),
            PerformanceSummary::default()
        );
        assert_eq!(data.get_or::<i64>("absent", 7), 7);
    }

    #[test]
    fn negative_ints_do_not_read_as_indices() {
        let data = SharedData::new().with(keys::SELECTED_DIFFICULTY, -1i64);
        assert_eq!(data.get::<usize>(keys::SELECTED_DIFFICULTY), None);
        assert_eq!(data.get::<f64>(keys::SELECTED_DIFFICULTY), Some(-1.0));
    }

    #[test]
    fn summaries_and_charts_are_carried_intact() {
        let summary = PerformanceSummary {
            score: 42,
            completion: CompletionReason::Failed,
            ..Default::default()
        };
        let chart = Chart {
            song_id: "x".to_string(),
            note_times: vec![1.0, 2.0],
            ..Default::default()
        };
        let mut data = SharedData::new()
            .with(keys::PERFORMANCE_SUMMARY, summary.clone())
            .with(keys::PARSED_CHART, chart);
        assert_eq!(data.get::<PerformanceSummary>(keys::PERFORMANCE_SUMMARY), Some(summary));
        let chart = data.get::<Rc<Chart>>(keys::PARSED_CHART).expect("chart");
        assert_eq!(chart.note_count(), 2);
        assert_eq!(data.len(), 2);
        data.clear();
        assert!(data.is_empty());
    }
}
