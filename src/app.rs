use crate::assets::{AssetManager, AssetSource, DiskSource, MemorySource};
use crate::config::{self, Config};
use crate::core::gfx::RenderList;
use crate::core::input::{InputCommand, InputQueue};
use crate::game::song::SongLibrary;
use crate::screens::{self, BUILTIN_ASSETS, ScreenSettings};
use crate::stage::{StageError, StageManager, StageServices, StageType, TransitionGate};

use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/* -------------------- input scripts -------------------- */

/// Walks Title -> Options (autoplay on) -> SongSelect -> Performance ->
/// Result -> SongSelect -> Title and exits.
pub const DEFAULT_SCRIPT: &str = "\
# stock demo run
await Title
wait 0.5
press down
press activate
await Config
wait 0.3
press activate
press back
await Title
wait 0.5
press up
press activate
await SongSelect
wait 0.5
press down
press activate
await Performance
await Result
wait 1.0
press activate
await SongSelect
wait 0.5
press back
await Title
wait 0.5
press back
";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptStep {
    Press(InputCommand),
    Wait(f32),
    /// Until the stage is current and no transition is in flight.
    Await(StageType),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    UnknownDirective { line: usize, directive: String },
    MissingArgument { line: usize, directive: &'static str },
    BadArgument { line: usize, argument: String },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDirective { line, directive } => {
                write!(f, "line {line}: unknown directive '{directive}'")
            }
            Self::MissingArgument { line, directive } => {
                write!(f, "line {line}: '{directive}' needs an argument")
            }
            Self::BadArgument { line, argument } => {
                write!(f, "line {line}: invalid argument '{argument}'")
            }
        }
    }
}

impl Error for ScriptError {}

/// What the script asks of the loop after a frame's steps were fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSignal {
    Running,
    Finished,
    Exit,
}

#[derive(Debug, Clone, Default)]
pub struct InputScript {
    steps: VecDeque<ScriptStep>,
    wait_left: f32,
}

impl FromStr for InputScript {
    type Err = ScriptError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut steps = VecDeque::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            let mut words = content.split_whitespace();
            let Some(directive) = words.next() else {
                continue;
            };
            let mut arg = |directive: &'static str| {
                words
                    .next()
                    .ok_or(ScriptError::MissingArgument { line, directive })
            };
            let bad = |argument: &str| ScriptError::BadArgument {
                line,
                argument: argument.to_string(),
            };
            let step = match directive.to_ascii_lowercase().as_str() {
                "press" => {
                    let a = arg("press")?;
                    ScriptStep::Press(a.parse().map_err(|()| bad(a))?)
                }
                "wait" => {
                    let a = arg("wait")?;
                    let secs = a
                        .parse::<f32>()
                        .ok()
                        .filter(|s| s.is_finite() && *s >= 0.0)
                        .ok_or_else(|| bad(a))?;
                    ScriptStep::Wait(secs)
                }
                "await" => {
                    let a = arg("await")?;
                    ScriptStep::Await(a.parse().map_err(|()| bad(a))?)
                }
                "exit" => ScriptStep::Exit,
                other => {
                    return Err(ScriptError::UnknownDirective {
                        line,
                        directive: other.to_string(),
                    });
                }
            };
            steps.push_back(step);
        }
        Ok(Self {
            steps,
            wait_left: 0.0,
        })
    }
}

impl InputScript {
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Feeds every step that is due this frame into `input`.
    pub fn advance(
        &mut self,
        dt: f32,
        current: Option<StageType>,
        settled: bool,
        input: &mut InputQueue,
    ) -> ScriptSignal {
        if self.wait_left > 0.0 {
            self.wait_left -= dt.max(0.0);
            if self.wait_left > 0.0 {
                return ScriptSignal::Running;
            }
        }
        while let Some(step) = self.steps.front().copied() {
            match step {
                ScriptStep::Press(cmd) => {
                    trace!("script: press {cmd:?}");
                    input.push(cmd);
                }
                ScriptStep::Wait(secs) => {
                    self.steps.pop_front();
                    self.wait_left = secs;
                    return ScriptSignal::Running;
                }
                ScriptStep::Await(stage) => {
                    if current != Some(stage) || !settled {
                        return ScriptSignal::Running;
                    }
                    debug!("script: reached {stage}");
                }
                ScriptStep::Exit => {
                    self.steps.pop_front();
                    return ScriptSignal::Exit;
                }
            }
            self.steps.pop_front();
        }
        ScriptSignal::Finished
    }
}

/* -------------------- driving loop -------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ExitRequested,
    ScriptExit,
    TimeLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub reason: StopReason,
    pub frames: u64,
    pub elapsed: f32,
    pub final_stage: Option<StageType>,
}

pub struct App {
    services: StageServices,
    manager: StageManager,
    render: RenderList,
    frame_dt: f32,
    max_run_seconds: f32,
    realtime: bool,
    elapsed: f32,
    frames: u64,
    last_report_second: u64,
}

fn asset_source(cfg: &Config) -> Box<dyn AssetSource> {
    if cfg.asset_root.is_empty() {
        let source = BUILTIN_ASSETS
            .iter()
            .fold(MemorySource::new(), |src, &(kind, path)| src.with(kind, path));
        Box::new(source)
    } else {
        info!("Loading assets from '{}'", cfg.asset_root);
        Box::new(DiskSource::new(&cfg.asset_root))
    }
}

impl App {
    pub fn new(cfg: &Config) -> Self {
        let mut services =
            StageServices::new(AssetManager::new(asset_source(cfg)), SongLibrary::demo());
        services.gate = TransitionGate::new(cfg.transition_cooldown_seconds);
        services.options = cfg.player_options();
        let manager = StageManager::new(screens::registry(&ScreenSettings::from_config(cfg)));
        Self {
            services,
            manager,
            render: RenderList::new(),
            frame_dt: cfg.frame_seconds(),
            max_run_seconds: cfg.max_run_seconds,
            realtime: cfg.realtime,
            elapsed: 0.0,
            frames: 0,
            last_report_second: 0,
        }
    }

    pub fn manager(&self) -> &StageManager {
        &self.manager
    }

    pub fn services(&self) -> &StageServices {
        &self.services
    }

    /// The last frame's draw commands.
    pub fn render_list(&self) -> &RenderList {
        &self.render
    }

    pub fn start(&mut self) -> Result<(), StageError> {
        self.manager
            .change_stage(StageType::Startup, None, None, &mut self.services.context())?;
        Ok(())
    }

    /// One fixed-timestep frame.
    pub fn step(&mut self, script: &mut InputScript) -> Result<ScriptSignal, StageError> {
        let dt = self.frame_dt;
        self.frames += 1;
        self.elapsed += dt;
        self.services.gate.begin_frame(dt);

        let signal = script.advance(
            dt,
            self.manager.current_stage_type(),
            !self.manager.is_transitioning(),
            &mut self.services.input,
        );
        self.manager.update(dt, &mut self.services.context())?;

        self.render.clear();
        self.manager.draw(dt, &mut self.render);
        for sound in self.services.audio.take_queued() {
            trace!("audio: {sound}");
        }

        let second = self.elapsed as u64;
        if second > self.last_report_second {
            self.last_report_second = second;
            let purged = self.services.assets.purge_released();
            info!(
                "t={second}s stage={:?} transition={:?} draws={} resident_assets={} purged={purged}",
                self.manager.current_stage_type(),
                self.manager.active_transition().map(|t| t.progress()),
                self.render.len(),
                self.services.assets.resident_count(),
            );
        }
        Ok(signal)
    }

    pub fn run(&mut self, mut script: InputScript) -> Result<RunReport, StageError> {
        self.start()?;
        let frame_time = Duration::from_secs_f32(self.frame_dt);
        let mut script_done = false;

        let reason = loop {
            let frame_start = Instant::now();
            let signal = self.step(&mut script)?;
            if signal == ScriptSignal::Exit {
                info!("Input script requested exit.");
                break StopReason::ScriptExit;
            }
            if signal == ScriptSignal::Finished && !script_done {
                script_done = true;
                debug!("Input script finished at frame {}", self.frames);
            }
            if self.manager.exit_requested() {
                info!("Exit requested; shutting down.");
                break StopReason::ExitRequested;
            }
            if self.max_run_seconds > 0.0 && self.elapsed >= self.max_run_seconds {
                warn!("MaxRunSeconds ({:.1}) reached; stopping.", self.max_run_seconds);
                break StopReason::TimeLimit;
            }
            if self.realtime
                && let Some(rest) = frame_time.checked_sub(frame_start.elapsed())
            {
                std::thread::sleep(rest);
            }
        };

        let report = RunReport {
            reason,
            frames: self.frames,
            elapsed: self.elapsed,
            final_stage: self.manager.current_stage_type(),
        };
        self.manager.dispose();
        Ok(report)
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cfg = config::get();
    let script = match std::env::args().nth(1) {
        Some(path) => {
            info!("Reading input script '{path}'");
            std::fs::read_to_string(&path)?.parse::<InputScript>()?
        }
        None => DEFAULT_SCRIPT.parse::<InputScript>()?,
    };
    let report = App::new(&cfg).run(script)?;
    info!(
        "Stopped after {} frames ({:.2}s): {:?}, last stage {:?}",
        report.frames, report.elapsed, report.reason, report.final_stage
    );
    Ok(())
}
