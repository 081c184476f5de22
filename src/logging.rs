//! Logging setup.
//!
//! Logging is configured once at startup, before any phase runs, and needs no
//! teardown.

use tracing_subscriber::EnvFilter;

/// How log output is filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default filter directive, e.g. `info` or `bq_load_bench=debug`.
    pub level: String,
    /// Let `RUST_LOG` override `level` when it is set.
    pub respect_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            respect_env: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// The filter directive in effect for this configuration.
    pub fn directive(&self) -> String {
        if self.respect_env {
            if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
                if !env.trim().is_empty() {
                    return env;
                }
            }
        }
        self.level.clone()
    }
}

/// Install the global subscriber writing to stderr.
///
/// Calling it again is harmless: the first subscriber stays in place.
pub fn init_logging(config: &LogConfig) {
    let filter =
        EnvFilter::try_new(config.directive()).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
