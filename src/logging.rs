//! Logging initialization for minidrive.
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to the
//! service and to HTTP request tracing, sqlx statement logging is held at
//! `warn`, and every other dependency logs warnings only.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Parse a configured level, falling back to `info`.
fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Directives used when `RUST_LOG` is absent.
fn default_directives(level: Level) -> String {
    // sqlx logs each statement at info; only `trace` lets them through.
    let sqlx = if level == Level::TRACE {
        Level::DEBUG
    } else {
        level.min(Level::WARN)
    };
    let app = level.as_str().to_ascii_lowercase();
    let sqlx = sqlx.as_str().to_ascii_lowercase();
    format!("warn,minidrive={app},tower_http={app},sqlx={sqlx}")
}

/// Build the filter from an optional `RUST_LOG` value and the configured level.
fn build_filter(env: Option<&str>, level: &str) -> EnvFilter {
    let defaults = default_directives(parse_level(level));
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid {}: {e}", EnvFilter::DEFAULT_ENV);
            EnvFilter::new(&defaults)
        }),
        None => EnvFilter::new(&defaults),
    }
}

fn filter_from_env(level: &str) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(env.as_deref(), level)
}

/// Initialize logging to stdout and the configured log file.
///
/// The log file is appended to, so restarts keep earlier entries.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    let writer = std::io::stdout.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter_from_env(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging.
///
/// Used by the operator commands and when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter_from_env(level))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" warn "), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_directives_hold_sqlx_at_warn() {
        assert_eq!(
            default_directives(Level::INFO),
            "warn,minidrive=info,tower_http=info,sqlx=warn"
        );
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,minidrive=debug,tower_http=debug,sqlx=warn"
        );
    }

    #[test]
    fn test_default_directives_trace_and_error() {
        assert_eq!(
            default_directives(Level::TRACE),
            "warn,minidrive=trace,tower_http=trace,sqlx=debug"
        );
        assert_eq!(
            default_directives(Level::ERROR),
            "warn,minidrive=error,tower_http=error,sqlx=error"
        );
    }

    #[test]
    fn test_default_directives_parse() {
        for level in [Level::TRACE, Level::INFO, Level::ERROR] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }

    #[test]
    fn test_build_filter_prefers_env() {
        let filter = build_filter(Some("minidrive=trace"), "info");
        assert_eq!(filter.to_string().to_lowercase(), "minidrive=trace");
    }

    #[test]
    fn test_build_filter_falls_back_on_blank_or_invalid_env() {
        for env in [None, Some(""), Some("   "), Some("minidrive=notalevel")] {
            let filter = build_filter(env, "info").to_string().to_lowercase();
            assert!(filter.contains("minidrive=info"), "{env:?}");
            assert!(filter.contains("sqlx=warn"), "{env:?}");
        }
    }
}
