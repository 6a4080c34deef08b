//! Subscriber setup for applications embedding the builder.
//!
//! Only available with the `logging` feature. Without it the crate just emits
//! `tracing` events and leaves subscriber installation to the caller.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::BuilderSettings;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "PACKCFG_LOG";

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    #[default]
    Warn,
    Info,
    /// Includes one event per merged fragment.
    Debug,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "trace" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install a compact stderr subscriber at `level`.
///
/// `PACKCFG_LOG` directives, when set, refine the default. Only the first
/// call in a process has any effect.
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level.as_filter().into())
            .with_env_var(LOG_ENV)
            .from_env_lossy();

        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                layer_fmt::layer()
                    .compact()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init();
    });
}

/// Install a subscriber at the level named by `settings.log_level`.
///
/// Unset or unrecognized levels fall back to [`LogLevel::default`].
pub fn init_logging_from_settings(settings: &BuilderSettings) {
    let level = settings
        .log_level
        .as_deref()
        .and_then(|level| level.parse().ok())
        .unwrap_or_default();
    init_logging(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("OFF".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn displays_as_filter_directive() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Silent.to_string(), "off");
    }

    #[test]
    fn init_is_idempotent() {
        let settings = BuilderSettings {
            log_level: Some("debug".into()),
            ..Default::default()
        };
        init_logging_from_settings(&settings);
        init_logging(LogLevel::Error);
    }
}
