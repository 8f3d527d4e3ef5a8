//! Connection settings.

use crate::monitor::{NoopHook, QueryHook, TracingSqlHook};
use tracing::Level;

/// Settings for a [`Supersql`](crate::Supersql) descriptor.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Hand out pooled connections instead of a single client.
    pub pooled: bool,
    /// Maximum pool size when pooled.
    pub max_pool_size: usize,
    /// Whether statements are logged through `tracing` before execution.
    pub log_sql: bool,
    /// Level of SQL log events.
    pub log_level: Level,
    /// Truncate logged SQL (in bytes). `None` logs statements in full.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            pooled: false,
            max_pool_size: 16,
            log_sql: true,
            log_level: Level::DEBUG,
            max_logged_sql_length: Some(200),
        }
    }
}

impl ConnectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pooled(mut self, pooled: bool) -> Self {
        self.pooled = pooled;
        self
    }

    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size.max(1);
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn max_logged_sql_length(mut self, len: Option<usize>) -> Self {
        self.max_logged_sql_length = len;
        self
    }

    /// The hook statements run through under this configuration.
    pub fn sql_hook(&self) -> Box<dyn QueryHook> {
        if !self.log_sql {
            return Box::new(NoopHook);
        }
        let hook = TracingSqlHook::new().level(self.log_level);
        Box::new(match self.max_logged_sql_length {
            Some(len) => hook.max_sql_length(len),
            None => hook.no_truncate(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectConfig::new();
        assert!(!config.pooled);
        assert_eq!(config.max_pool_size, 16);
        assert!(config.log_sql);
        assert_eq!(config.max_logged_sql_length, Some(200));
    }

    #[test]
    fn builder_methods() {
        let config = ConnectConfig::new()
            .pooled(true)
            .max_pool_size(0)
            .log_sql(false)
            .log_level(Level::INFO)
            .max_logged_sql_length(None);
        assert!(config.pooled);
        assert_eq!(config.max_pool_size, 1);
        assert!(!config.log_sql);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.max_logged_sql_length, None);
    }
}
