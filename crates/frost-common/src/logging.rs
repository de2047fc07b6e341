//! Logging for frost
//!
//! The logging service is constructed explicitly at startup rather than
//! lazily behind a singleton: callers build a [`LogConfig`] and call
//! [`init_logging`] once. A display layer may additionally register a single
//! real-time subscriber callback that receives every formatted log line,
//! torn down with the process (or explicitly via
//! [`clear_log_subscriber`]).

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::EnvFilter;

/// The one optional real-time log subscriber.
static LOG_SUBSCRIBER: Mutex<Option<Box<dyn Fn(&str) + Send>>> = Mutex::new(None);

/// Logging configuration matching the config file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Include module target
    #[serde(default = "default_true")]
    pub show_target: bool,

    /// Use ANSI colors
    #[serde(default = "default_true")]
    pub ansi_colors: bool,

    /// Log level as string
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            timestamps: true,
            show_target: true,
            ansi_colors: true,
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Verbose configuration for debugging sessions
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    /// Parse level string to tracing Level
    pub fn get_level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Initialize logging with the given configuration
///
/// Can be called multiple times but only the first call installs the
/// global subscriber.
pub fn init_logging(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.show_target)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(CallbackLayer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Initialize logging from a TOML config file with a `[logging]` table
pub fn init_logging_from_file(path: &str) -> crate::error::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| crate::error::Error::Internal(format!("Failed to read config file: {}", e)))?;

    #[derive(Deserialize, Default)]
    struct ConfigWrapper {
        #[serde(default)]
        logging: Option<LogConfig>,
    }

    let wrapper: ConfigWrapper = toml::from_str(&content).map_err(|e| {
        crate::error::Error::Serialization(format!("Failed to parse config file: {}", e))
    })?;

    init_logging(&wrapper.logging.unwrap_or_default());
    Ok(())
}

/// Register the real-time log subscriber, replacing any previous one.
pub fn set_log_subscriber<F>(callback: F)
where
    F: Fn(&str) + Send + 'static,
{
    if let Ok(mut guard) = LOG_SUBSCRIBER.lock() {
        *guard = Some(Box::new(callback));
    }
}

/// Remove the real-time log subscriber if one is registered.
pub fn clear_log_subscriber() {
    if let Ok(mut guard) = LOG_SUBSCRIBER.lock() {
        *guard = None;
    }
}

/// Forwards formatted event lines to the registered subscriber callback.
struct CallbackLayer;

impl<S: Subscriber> Layer<S> for CallbackLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let guard = match LOG_SUBSCRIBER.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        let Some(callback) = guard.as_ref() else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        callback(&format!(
            "[{}] {}: {}",
            meta.level(),
            meta.target(),
            visitor.message
        ));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.timestamps);
        assert!(config.show_target);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_log_config_debug() {
        let config = LogConfig::debug();
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_get_level() {
        assert_eq!(LogConfig::default().get_level(), Level::INFO);
        assert_eq!(LogConfig::debug().get_level(), Level::DEBUG);
        assert_eq!(
            LogConfig::default().with_level("trace").get_level(),
            Level::TRACE
        );
        assert_eq!(
            LogConfig::default().with_level("warning").get_level(),
            Level::WARN
        );
        assert_eq!(
            LogConfig::default().with_level("bogus").get_level(),
            Level::INFO
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = LogConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: LogConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.level, config.level);
        assert_eq!(parsed.ansi_colors, config.ansi_colors);
    }

    #[test]
    fn test_subscriber_register_and_clear() {
        // Register, replace, clear; none of it should panic or deadlock.
        set_log_subscriber(|_| {});
        set_log_subscriber(|_| {});
        clear_log_subscriber();
        clear_log_subscriber();
    }
}
