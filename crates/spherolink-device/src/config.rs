use std::time::Duration;

use crate::pool::Backpressure;

/// Default window for a synchronous reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default number of attempts for retried commands.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default number of handler worker threads.
pub const DEFAULT_HANDLER_WORKERS: usize = 4;
/// Default handler queue depth.
pub const DEFAULT_HANDLER_QUEUE_DEPTH: usize = 64;

/// Engine tuning, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// How long one attempt waits for its acknowledgment.
    pub response_timeout: Duration,
    /// Attempts per retried command, and per initial connect.
    pub max_attempts: u32,
    /// How long to wait for a forwarded diagnostic dump.
    pub diagnostic_timeout: Duration,
    /// Worker threads running async event handlers.
    pub handler_workers: usize,
    /// Events that may wait for a handler worker.
    pub handler_queue_depth: usize,
    /// What happens to new events when the handler queue is full.
    pub backpressure: Backpressure,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            diagnostic_timeout: DEFAULT_RESPONSE_TIMEOUT * 10,
            handler_workers: DEFAULT_HANDLER_WORKERS,
            handler_queue_depth: DEFAULT_HANDLER_QUEUE_DEPTH,
            backpressure: Backpressure::DropOldest,
        }
    }
}

impl DeviceConfig {
    /// Set the reply window and scale the diagnostic window with it.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self.diagnostic_timeout = timeout * 10;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.response_timeout, Duration::from_secs(1));
        assert_eq!(config.diagnostic_timeout, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backpressure, Backpressure::DropOldest);
    }

    #[test]
    fn diagnostic_window_follows_response_timeout() {
        let config = DeviceConfig::default()
            .with_response_timeout(Duration::from_millis(200))
            .with_max_attempts(0);
        assert_eq!(config.diagnostic_timeout, Duration::from_secs(2));
        assert_eq!(config.max_attempts, 1);
    }
}
