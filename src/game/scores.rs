use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::game::stage_stats::PerformanceSummary;

const SCORE_LOG_FILE: &str = "scores.jsonl";

/// One line of the local score log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub song_id: String,
    pub played_at: String,
    pub summary: PerformanceSummary,
}

impl ScoreRecord {
    pub fn now(song_id: &str, summary: PerformanceSummary) -> Self {
        Self {
            song_id: song_id.to_string(),
            played_at: Local::now().to_rfc3339(),
            summary,
        }
    }
}

/// Platform data directory location used when no explicit log path is set.
pub fn default_score_log_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "stagehand")
        .map(|dirs| dirs.data_dir().join(SCORE_LOG_FILE))
}

pub fn append_record(path: &Path, record: &ScoreRecord) -> io::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    let line = serde_json::to_string(record).map_err(io::Error::other)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    info!("Stored score for '{}' in {:?}", record.song_id, path);
    Ok(())
}

/// Reads every well-formed record; malformed lines are skipped with a warning.
pub fn load_records(path: &Path) -> io::Result<Vec<ScoreRecord>> {
    let file = fs::File::open(path)?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ScoreRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed score line {} in {:?}: {e}", idx + 1, path),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::stage_stats::CompletionReason;

    #[test]
    fn records_round_trip_through_the_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SCORE_LOG_FILE);
        let summary = PerformanceSummary {
            score: 120,
            max_combo: 24,
            total_notes: 24,
            final_life: 0.7,
            completion: CompletionReason::Cleared,
            ..Default::default()
        };
        append_record(&path, &ScoreRecord::now("glass-tide", summary.clone())).expect("append");
        append_record(&path, &ScoreRecord::now("glass-tide", PerformanceSummary::default()))
            .expect("append");
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "not json"))
            .expect("corrupt line");

        let records = load_records(&path).expect("load");
        assert_eq!(records.len(), 2, "malformed line should be skipped");
        assert_eq!(records[0].summary, summary);
        assert_eq!(records[1].song_id, "glass-tide");
        assert!(!records[0].played_at.is_empty());
    }
}
