//! Explicit logging capability handed to each engine component
//!
//! Components never reach for global logger state; they receive an
//! `EngineLogger` at construction and log through it. The binary installs
//! the `env_logger` backend behind the `log` facade.

use log::{debug, error, info, warn};
use serde_json::json;

/// Log levels for engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Logger handle scoped to one engine component
#[derive(Debug, Clone)]
pub struct EngineLogger {
    /// `log` target, e.g. `lsfgctl::service`
    target: String,
    /// Most verbose level this handle forwards
    level: LogLevel,
}

impl EngineLogger {
    /// Create a logger for the named component
    pub fn new(component: &str, level: LogLevel) -> Self {
        Self {
            target: format!("lsfgctl::{}", component),
            level,
        }
    }

    /// Logger that forwards nothing, for tests and library callers without a backend
    pub fn silent() -> Self {
        Self {
            target: "lsfgctl".to_string(),
            level: LogLevel::Error,
        }
    }

    /// Derive a logger for a sub-component with the same level
    pub fn child(&self, component: &str) -> Self {
        Self {
            target: format!("{}::{}", self.target, component),
            level: self.level,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    /// Log a durable write to the config file or launch script
    pub fn log_config_write(&self, path: &std::path::Path, bytes: usize) {
        let data = json!({
            "event": "config_write",
            "path": path.display().to_string(),
            "bytes": bytes,
        });
        self.structured(LogLevel::Info, "Wrote configuration file", &data);
    }

    /// Log the outcome of an active profile detection query
    pub fn log_profile_detection(&self, profile: Option<&str>, strategy: Option<&str>) {
        let data = json!({
            "event": "profile_detection",
            "profile": profile,
            "strategy": strategy,
        });
        let message = match profile {
            Some(name) => format!("Active profile detected: {}", name),
            None => "No active game profile detected".to_string(),
        };
        self.structured(LogLevel::Info, &message, &data);
    }

    /// Log a read-side degradation that was absorbed
    pub fn log_degradation(&self, what: &str, reason: &str) {
        let data = json!({
            "event": "degradation",
            "what": what,
            "reason": reason,
        });
        self.structured(LogLevel::Warn, &format!("Falling back to defaults for {}", what), &data);
    }

    fn structured(&self, level: LogLevel, message: &str, data: &serde_json::Value) {
        self.emit(level, &format!("{} | {}", message, data));
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if !self.should_log(level) {
            return;
        }

        let target = self.target.as_str();
        match level {
            LogLevel::Error => error!(target: target, "{}", message),
            LogLevel::Warn => warn!(target: target, "{}", message),
            LogLevel::Info => info!(target: target, "{}", message),
            LogLevel::Debug => debug!(target: target, "{}", message),
        }
    }

    /// Check if we should log at this level
    fn should_log(&self, level: LogLevel) -> bool {
        level <= self.level
    }
}

impl Default for EngineLogger {
    fn default() -> Self {
        Self::new("engine", LogLevel::Info)
    }
}

/// Map the CLI verbosity count to a `log` filter
pub fn level_filter(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

/// Install the `env_logger` backend; `RUST_LOG` takes precedence over verbosity
pub fn init_backend(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_filter(verbosity));
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A second init (e.g. in tests) keeps the first backend
    if builder.try_init().is_err() {
        debug!("logger backend already installed");
    }
}
