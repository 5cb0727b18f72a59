use std::env;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Level named by `BATTLESHIP_LOG`, `info` when unset or unparsable.
pub fn log_level() -> LevelFilter {
    env::var("BATTLESHIP_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install a terminal logger on stderr at [`log_level`]. Stdout stays free for
/// program output. Later calls are ignored.
pub fn init_logging() {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_time_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(log_level(), config, TerminalMode::Stderr, ColorChoice::Never);
}
