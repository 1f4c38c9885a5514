use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "scheduler.log";

/// Routes `log` output of the scheduler to stderr and `logs/scheduler.log`.
/// The level comes from `RUST_LOG`, default `info`. Setup failures are only
/// reported on stderr.
pub fn init() {
    if let Err(e) = fs::create_dir_all(LOG_DIR) {
        eprintln!("Failed to create log directory at '{}': {}", LOG_DIR, e);
    }

    let log_file_path = format!("{}/{}", LOG_DIR, LOG_FILE);

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let base_config = Dispatch::new().level(log_level_filter);

    let colors = ColoredLevelConfig::new().warn(Color::Yellow).info(Color::Green).debug(Color::Blue);
    let console_config = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("{} {} {}", Local::now().format("%H:%M:%S%.3f"), colors.color(record.level()), message))
        })
        .chain(std::io::stderr());

    let mut dispatch = base_config.chain(console_config);

    match fern::log_file(&log_file_path) {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("{} {:>5} [{}] {}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"), record.level(), record.target(), message))
                })
                .chain(file);
            dispatch = dispatch.chain(file_config);
        }
        Err(e) => eprintln!("Failed to open log file '{}': {}", log_file_path, e),
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::debug!("Scheduler log file: '{}'.", log_file_path);
}
