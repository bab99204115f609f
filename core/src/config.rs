//! Construction-time configuration for `RestClient`.
//!
//! # Design
//! Tracing is a per-client field rather than process-wide state, so two
//! clients in one process can trace independently. `from_env` is the only
//! place the environment is consulted.

use std::time::Duration;

/// Environment variable that enables verbose tracing when non-empty.
pub const DEBUG_ENV: &str = "REST_DEBUG";

/// Environment variable holding a whole-request timeout in seconds.
pub const TIMEOUT_ENV: &str = "REST_TIMEOUT_SECS";

/// Settings fixed when a client is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Log every request, response, header and drained body.
    pub verbose: bool,
    /// Upper bound on a whole request, enforced by the transport. `None`
    /// leaves the transport's own behavior in place.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Read `REST_DEBUG` and `REST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let verbose = lookup(DEBUG_ENV).is_some_and(|v| !v.is_empty());
        let timeout = lookup(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        Self { verbose, timeout }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
