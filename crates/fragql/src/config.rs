use std::time::Duration;
use tracing::Level;

/// Configuration for [`Operator`](crate::Operator).
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Upper bound on a single backend call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Tracing level of the per-statement SQL event.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl OperatorConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend call timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
