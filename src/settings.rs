//! Static scaffold configuration.
//!
//! A single struct read once at startup and passed explicitly to the parts
//! that need it. There is deliberately no CLI or environment surface here;
//! hosts embed the scaffold and own their own configuration story.

use std::time::Duration;

/// Tunables for caching and remote calls.
#[derive(Debug, Clone)]
pub struct ScaffoldSettings {
    /// How long a cached collection stays valid.
    pub cache_ttl: Duration,
    /// Per-request timeout for the REST gateway.
    pub request_timeout: Duration,
    /// Extra attempts after a failed remote call (0 = no retry).
    pub retry_count: u32,
    /// Fixed delay between retry attempts.
    pub retry_delay: Duration,
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(30),
            retry_count: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ScaffoldSettings::default();
        assert_eq!(settings.cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.retry_count, 2);
    }
}
