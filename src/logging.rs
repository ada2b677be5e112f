//! Tracing subscriber setup for embedders and tests.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, SombraError};

/// Installs a global `fmt` subscriber filtered by `level`
/// (any `EnvFilter` directive, e.g. `"sombra_cursor=trace"`).
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| SombraError::Config(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| SombraError::Config("Logging already initialized".into()))
}
