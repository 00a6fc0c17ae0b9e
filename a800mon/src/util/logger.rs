// This file is part of a800mon.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::collections::HashMap;
use std::str::FromStr;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Stderr logger with a global level and per-target overrides, configured
/// from `--loglevel` and repeated `--log target=level` flags.
pub struct Logger {
    level: LevelFilter,
    targets: HashMap<String, LevelFilter>,
}

impl Logger {
    pub fn build(level: &str) -> Result<Logger, String> {
        let level = parse_level(level)?;
        Ok(Logger {
            level,
            targets: HashMap::new(),
        })
    }

    pub fn add_target(&mut self, target: String, level: &str) -> Result<(), String> {
        let level = parse_level(level)
            .map_err(|_| format!("invalid log level {} for target {}", level, target))?;
        self.targets.insert(target, level);
        Ok(())
    }

    pub fn enable(logger: Logger) -> Result<(), String> {
        let max_level = logger
            .targets
            .values()
            .fold(logger.level, |acc, &level| acc.max(level));
        log::set_boxed_logger(Box::new(logger))
            .map(|_| log::set_max_level(max_level))
            .map_err(|_| "cannot initialize logging".to_string())
    }

    fn target_level(&self, target: &str) -> LevelFilter {
        match self.targets.get(target) {
            Some(&level) => level,
            None => self.level,
        }
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(level).map_err(|_| format!("invalid log level {}", level))
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.target_level(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} [{}] - {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_and_targets_override() {
        let mut logger = Logger::build("warn").unwrap();
        logger.add_target("rpc".to_string(), "debug").unwrap();
        assert_eq!(logger.target_level("rpc"), LevelFilter::Debug);
        assert_eq!(logger.target_level("app"), LevelFilter::Warn);
        assert!(Logger::build("noisy").is_err());
        assert!(logger
            .add_target("x".to_string(), "nope")
            .unwrap_err()
            .contains("invalid log level"));
    }

    #[test]
    fn enabled_respects_target_level() {
        let mut logger = Logger::build("error").unwrap();
        logger.add_target("rpc".to_string(), "info").unwrap();
        let meta = Metadata::builder().level(Level::Info).target("rpc").build();
        assert!(logger.enabled(&meta));
        let meta = Metadata::builder().level(Level::Info).target("app").build();
        assert!(!logger.enabled(&meta));
    }
}
