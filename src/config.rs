use crate::game::options::PlayerOptions;
use crate::game::scores;
use crate::stage::Easing;
use ini::Ini;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, PoisonError};

const CONFIG_PATH: &str = "stagehand.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // [Options]
    pub log_level: LogLevel,
    pub frame_rate: u32,
    pub max_run_seconds: f32,
    pub realtime: bool,
    /// Empty means the built-in asset set.
    pub asset_root: String,
    pub fade_duration: f32,
    pub fade_easing: Easing,
    pub transition_cooldown_seconds: f32,
    pub save_scores: bool,
    /// Empty means the platform data directory.
    pub score_log: String,
    // [Stages]
    pub startup_hold_seconds: f32,
    pub song_transition_hold_seconds: f32,
    pub lead_in_seconds: f32,
    // [Player]
    pub autoplay: bool,
    pub global_offset_seconds: f32,
}

impl Default for Config {
    fn default() -> Self {
        let player = PlayerOptions::default();
        Self {
            log_level: LogLevel::Warn,
            frame_rate: 60,
            max_run_seconds: 120.0,
            realtime: false,
            asset_root: String::new(),
            fade_duration: 0.4,
            fade_easing: Easing::Linear,
            transition_cooldown_seconds: 0.25,
            save_scores: true,
            score_log: String::new(),
            startup_hold_seconds: 1.0,
            song_transition_hold_seconds: 1.5,
            lead_in_seconds: 1.0,
            autoplay: player.autoplay,
            global_offset_seconds: player.global_offset_seconds,
        }
    }
}

// Global, mutable configuration instance.
static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

#[inline(always)]
fn parse_flag(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
    {
        Some(true)
    } else if v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

#[inline(always)]
fn parse_seconds(v: &str) -> Option<f32> {
    v.trim().parse::<f32>().ok().filter(|s| s.is_finite())
}

impl Config {
    /// Builds a config from a parsed file. Missing or malformed keys keep
    /// their defaults.
    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();
        let get = |section: &str, key: &str| conf.get_from(Some(section), key);

        Self {
            log_level: get("Options", "LogLevel")
                .and_then(|v| LogLevel::from_str(v).ok())
                .unwrap_or(default.log_level),
            frame_rate: get("Options", "FrameRate")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map_or(default.frame_rate, |v| v.clamp(1, 1000)),
            max_run_seconds: get("Options", "MaxRunSeconds")
                .and_then(parse_seconds)
                .map_or(default.max_run_seconds, |v| v.max(0.0)),
            realtime: get("Options", "Realtime")
                .and_then(parse_flag)
                .unwrap_or(default.realtime),
            asset_root: get("Options", "AssetRoot")
                .map_or(default.asset_root, |v| v.trim().to_string()),
            fade_duration: get("Options", "FadeDuration")
                .and_then(parse_seconds)
                .map_or(default.fade_duration, |v| v.max(0.0)),
            fade_easing: get("Options", "FadeEasing")
                .and_then(|v| Easing::from_str(v).ok())
                .unwrap_or(default.fade_easing),
            transition_cooldown_seconds: get("Options", "TransitionCooldownSeconds")
                .and_then(parse_seconds)
                .map_or(default.transition_cooldown_seconds, |v| v.max(0.0)),
            save_scores: get("Options", "SaveScores")
                .and_then(parse_flag)
                .unwrap_or(default.save_scores),
            score_log: get("Options", "ScoreLog")
                .map_or(default.score_log, |v| v.trim().to_string()),
            startup_hold_seconds: get("Stages", "StartupHoldSeconds")
                .and_then(parse_seconds)
                .map_or(default.startup_hold_seconds, |v| v.max(0.0)),
            song_transition_hold_seconds: get("Stages", "SongTransitionHoldSeconds")
                .and_then(parse_seconds)
                .map_or(default.song_transition_hold_seconds, |v| v.max(0.0)),
            lead_in_seconds: get("Stages", "LeadInSeconds")
                .and_then(parse_seconds)
                .map_or(default.lead_in_seconds, |v| v.max(0.0)),
            autoplay: get("Player", "Autoplay")
                .and_then(parse_flag)
                .unwrap_or(default.autoplay),
            global_offset_seconds: get("Player", "GlobalOffsetSeconds")
                .and_then(parse_seconds)
                .map_or(default.global_offset_seconds, |v| {
                    v.clamp(-PlayerOptions::OFFSET_LIMIT, PlayerOptions::OFFSET_LIMIT)
                }),
        }
    }

    pub fn to_ini(&self) -> Ini {
        let flag = |b: bool| if b { "1" } else { "0" };
        let mut conf = Ini::new();
        conf.with_section(Some("Options"))
            .set("LogLevel", self.log_level.as_str())
            .set("FrameRate", self.frame_rate.to_string())
            .set("MaxRunSeconds", self.max_run_seconds.to_string())
            .set("Realtime", flag(self.realtime))
            .set("AssetRoot", self.asset_root.as_str())
            .set("FadeDuration", self.fade_duration.to_string())
            .set("FadeEasing", self.fade_easing.as_str())
            .set(
                "TransitionCooldownSeconds",
                self.transition_cooldown_seconds.to_string(),
            )
            .set("SaveScores", flag(self.save_scores))
            .set("ScoreLog", self.score_log.as_str());
        conf.with_section(Some("Stages"))
            .set("StartupHoldSeconds", self.startup_hold_seconds.to_string())
            .set(
                "SongTransitionHoldSeconds",
                self.song_transition_hold_seconds.to_string(),
            )
            .set("LeadInSeconds", self.lead_in_seconds.to_string());
        conf.with_section(Some("Player"))
            .set("Autoplay", flag(self.autoplay))
            .set("GlobalOffsetSeconds", self.global_offset_seconds.to_string());
        conf
    }

    /// Initial player options derived from `[Player]`.
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            autoplay: self.autoplay,
            global_offset_seconds: self.global_offset_seconds,
        }
    }

    /// Where finished plays are recorded, if anywhere.
    pub fn score_log_path(&self) -> Option<PathBuf> {
        if !self.save_scores {
            return None;
        }
        if self.score_log.is_empty() {
            scores::default_score_log_path()
        } else {
            Some(PathBuf::from(&self.score_log))
        }
    }

    pub fn frame_seconds(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    Config::default().to_ini().write_to_file(path)
}

/// Reads `path` into the global config, creating it with defaults first if
/// it does not exist. Any failure leaves the defaults in place.
pub fn load_from(path: &Path) {
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }

    let loaded = match Ini::load_from_file(path) {
        Ok(conf) => {
            info!("Configuration loaded from '{}'.", path.display());
            Config::from_ini(&conf)
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using default values.", path.display());
            Config::default()
        }
    };
    *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = loaded;
}

pub fn load() {
    load_from(Path::new(CONFIG_PATH));
}

pub fn get() -> Config {
    CONFIG
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_malformed_keys_fall_back_to_defaults() {
        let conf = Ini::load_from_str(
            "[Options]\nLogLevel=chatty\nFrameRate=abc\nFadeDuration=0.25\n\
             FadeEasing=smoothstep\n\
             [Player]\nAutoplay=yes\n",
        )
        .expect("ini");
        let cfg = Config::from_ini(&conf);
        let default = Config::default();
        assert_eq!(cfg.log_level, default.log_level);
        assert_eq!(cfg.frame_rate, default.frame_rate);
        assert_eq!(cfg.fade_duration, 0.25);
        assert_eq!(cfg.fade_easing, Easing::SmoothStep);
        assert!(cfg.autoplay);
        assert_eq!(cfg.lead_in_seconds, default.lead_in_seconds);
    }

    #[test]
    fn values_are_clamped_into_range() {
        let conf = Ini::load_from_str(
            "[Options]\nFrameRate=0\nFadeDuration=-3\n[Player]\nGlobalOffsetSeconds=9\n",
        )
        .expect("ini");
        let cfg = Config::from_ini(&conf);
        assert_eq!(cfg.frame_rate, 1);
        assert_eq!(cfg.fade_duration, 0.0);
        assert_eq!(cfg.global_offset_seconds, PlayerOptions::OFFSET_LIMIT);
    }

    #[test]
    fn written_file_reads_back_identically() {
        let cfg = Config {
            log_level: LogLevel::Debug,
            realtime: true,
            score_log: "scores/test.jsonl".to_string(),
            startup_hold_seconds: 0.5,
            ..Config::default()
        };
        let mut buf = Vec::new();
        cfg.to_ini().write_to(&mut buf).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let back = Config::from_ini(&Ini::load_from_str(&text).expect("parse"));
        assert_eq!(back, cfg);
    }

    #[test]
    fn score_log_path_honors_save_flag_and_override() {
        let mut cfg = Config {
            score_log: "custom.jsonl".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.score_log_path(), Some(PathBuf::from("custom.jsonl")));
        cfg.save_scores = false;
        assert_eq!(cfg.score_log_path(), None);
    }

    #[test]
    fn load_from_creates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stagehand.ini");
        load_from(&path);
        assert!(path.exists());
        assert_eq!(get(), Config::default());
    }
}
