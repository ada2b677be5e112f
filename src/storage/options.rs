use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Result, SombraError};

use super::metrics::CursorMetrics;

/// Default traversal-step budget of a single chain walk.
pub const DEFAULT_MAX_CHAIN_STEPS: u64 = 1 << 24;
/// Default initial capacity of the label cursor buffer.
pub const DEFAULT_LABEL_CAPACITY: usize = 16;
/// Default initial capacity of the property overflow buffer.
pub const DEFAULT_OVERFLOW_CAPACITY: usize = 256;

/// How a [`Statement`](crate::cursor::Statement) reacts when a cursor kind is
/// acquired while an earlier acquisition of the same kind is still open.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Reject the acquisition with `SombraError::PoolMisuse`.
    #[default]
    Strict,
    /// Hand out the same instance again. The earlier handle keeps reading the
    /// shared state, so its row silently follows the newer initialization.
    Shared,
}

/// Configuration supplied when creating a [`Statement`](crate::cursor::Statement).
#[derive(Clone)]
pub struct CursorOptions {
    /// Behavior on double acquisition of a cursor kind.
    pub pool_policy: PoolPolicy,
    /// Maximum records a single cursor may resolve between two initializations.
    pub max_chain_steps: u64,
    /// Initial capacity reserved for label sequences.
    pub label_capacity: usize,
    /// Initial capacity reserved for materialized property values.
    pub overflow_capacity: usize,
    /// Optional metrics collection implementation.
    pub metrics: Option<Arc<dyn CursorMetrics>>,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            pool_policy: PoolPolicy::Strict,
            max_chain_steps: DEFAULT_MAX_CHAIN_STEPS,
            label_capacity: DEFAULT_LABEL_CAPACITY,
            overflow_capacity: DEFAULT_OVERFLOW_CAPACITY,
            metrics: None,
        }
    }
}

impl CursorOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pool policy.
    pub fn pool_policy(mut self, policy: PoolPolicy) -> Self {
        self.pool_policy = policy;
        self
    }

    /// Sets the traversal-step budget; zero is clamped to one.
    pub fn max_chain_steps(mut self, steps: u64) -> Self {
        self.max_chain_steps = steps.max(1);
        self
    }

    /// Sets the initial label buffer capacity.
    pub fn label_capacity(mut self, capacity: usize) -> Self {
        self.label_capacity = capacity;
        self
    }

    /// Sets the initial property value buffer capacity.
    pub fn overflow_capacity(mut self, capacity: usize) -> Self {
        self.overflow_capacity = capacity;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn CursorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Overlays the values present in `cfg`.
    pub fn apply(mut self, cfg: &CursorConfig) -> Result<Self> {
        if let Some(policy) = cfg.pool_policy {
            self.pool_policy = policy;
        }
        if let Some(steps) = cfg.max_chain_steps {
            if steps == 0 {
                return Err(SombraError::Config(
                    "cursor.max_chain_steps must be positive".into(),
                ));
            }
            self.max_chain_steps = steps;
        }
        if let Some(capacity) = cfg.label_capacity {
            self.label_capacity = capacity;
        }
        if let Some(capacity) = cfg.overflow_capacity {
            self.overflow_capacity = capacity;
        }
        Ok(self)
    }

    /// Parses the `[cursor]` table of a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|err| SombraError::Config(format!("failed to parse cursor config: {err}")))?;
        Self::default().apply(&file.cursor)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            SombraError::Config(format!(
                "failed to read cursor config {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Serializable subset of [`CursorOptions`]; unset fields keep their defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    /// Pool policy override.
    pub pool_policy: Option<PoolPolicy>,
    /// Traversal-step budget override.
    pub max_chain_steps: Option<u64>,
    /// Label buffer capacity override.
    pub label_capacity: Option<usize>,
    /// Property value buffer capacity override.
    pub overflow_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cursor: CursorConfig,
}
