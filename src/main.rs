use stagehand::{app, config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logger accepts everything; the effective level is the global max level.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    let cfg = config::get();
    log::set_max_level(cfg.log_level.as_level_filter());
    log::info!(
        "stagehand {} ({} fps, realtime {})",
        env!("CARGO_PKG_VERSION"),
        cfg.frame_rate,
        cfg.realtime
    );
    app::run()
}
