use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

/// Topic targets used by the debug macros below.
pub const TOPICS: [&str; 5] = ["move", "zone", "spell", "ai", "combat"];

#[derive(Debug)]
struct WandfireLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl log::Log for WandfireLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() > self.level {
            return false;
        }
        // Debug/trace output is limited to the selected topics when a filter is set
        if let Some(filters) = &self.debug_filters {
            if metadata.level() >= log::Level::Debug {
                return filters.contains(metadata.target())
                    || filters.iter().any(|f| metadata.target().starts_with(f.as_str()));
            }
        }
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m",
            log::Level::Warn => "\x1B[33m",
            log::Level::Info => "\x1B[32m",
            log::Level::Debug => "\x1B[36m",
            log::Level::Trace => "\x1B[35m",
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {target}: {message}",
            level = record.level(),
            target = record.target(),
            message = record.args()
        );
        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // A closed stdout is not worth crashing the simulation over
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static LOGGER: OnceLock<WandfireLogger> = OnceLock::new();

/// Parses a comma-separated topic list such as "move,ai".
pub fn parse_debug_filter(filter: &str) -> HashSet<String> {
    filter
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs the colored stdout logger. Only the first call's settings stick.
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| WandfireLogger {
        level,
        debug_filters: debug_filter.as_deref().map(parse_debug_filter),
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

#[macro_export]
macro_rules! debug_move {
    ($entity_id:expr, $tick:expr, $($arg:tt)*) => {
        log::debug!(target: "move", "[E{:02}][T{:05}] {}", $entity_id, $tick, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_zone {
    ($entity_id:expr, $tick:expr, $($arg:tt)*) => {
        log::debug!(target: "zone", "[E{:02}][T{:05}] {}", $entity_id, $tick, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_spell {
    ($entity_id:expr, $tick:expr, $($arg:tt)*) => {
        log::debug!(target: "spell", "[E{:02}][T{:05}] {}", $entity_id, $tick, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_ai {
    ($entity_id:expr, $tick:expr, $($arg:tt)*) => {
        log::debug!(target: "ai", "[E{:02}][T{:05}] {}", $entity_id, $tick, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_combat {
    ($entity_id:expr, $tick:expr, $($arg:tt)*) => {
        log::debug!(target: "combat", "[E{:02}][T{:05}] {}", $entity_id, $tick, format_args!($($arg)*))
    };
}
