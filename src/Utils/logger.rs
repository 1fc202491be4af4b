use crate::settings::NumericsConfig;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;

/// Maps a level name to a filter; unknown names fall back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Terminal logger, plus a file logger when `log_file` is set.
/// A second call is a no-op since the global logger can be set once.
pub fn init_logger(config: &NumericsConfig) -> Result<(), std::io::Error> {
    let level = parse_level(&config.log_level);
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &config.log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    if CombinedLogger::init(loggers).is_err() {
        log::debug!("logger already initialised");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("whatever"), LevelFilter::Info);
    }

    #[test]
    fn file_logger_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numerics.log");
        let config = NumericsConfig {
            log_file: Some(path.to_string_lossy().to_string()),
            ..NumericsConfig::default()
        };
        init_logger(&config).unwrap();
        assert!(path.exists());
    }
}
