use std::time::Duration;

use tm_base::PendingKey;
use tm_base::settings::{ExpiryPolicy, Settings};

/// A deferred query awaiting its final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub content_id: String,
    pub query: String,
    /// Id of the placeholder assistant message to rewrite
    pub message_id: String,
    /// Registration time (ms since UNIX epoch)
    pub created_at_ms: u64,
}

impl PendingQuery {
    pub fn key(&self) -> PendingKey {
        PendingKey::new(self.content_id.clone(), self.query.clone())
    }

    /// Strictly older than `timeout` at `now_ms`.
    pub fn is_expired(&self, now_ms: u64, timeout: Duration) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > timeout.as_millis() as u64
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub expiry_policy: ExpiryPolicy,
}

impl From<&Settings> for PollerConfig {
    fn from(s: &Settings) -> Self {
        Self { interval: s.poll_interval, timeout: s.pending_timeout, expiry_policy: s.expiry_policy }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub resolved: Vec<PendingKey>,
    pub expired: Vec<PendingKey>,
    /// Entries left in the registry after the sweep
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(created_at_ms: u64) -> PendingQuery {
        PendingQuery {
            content_id: "vid".into(),
            query: "q".into(),
            message_id: "msg_1".into(),
            created_at_ms,
        }
    }

    #[test]
    fn expiry_is_strictly_after_timeout() {
        let p = pending(1_000);
        let timeout = Duration::from_secs(120);
        assert!(!p.is_expired(1_000 + 120_000, timeout));
        assert!(p.is_expired(1_000 + 120_001, timeout));
    }

    #[test]
    fn clock_going_backwards_never_expires() {
        assert!(!pending(10_000).is_expired(5_000, Duration::from_secs(1)));
    }

    #[test]
    fn config_follows_settings() {
        let c = PollerConfig::default();
        assert_eq!(c.interval, Duration::from_secs(5));
        assert_eq!(c.timeout, Duration::from_secs(120));
        assert_eq!(c.expiry_policy, ExpiryPolicy::RewritePlaceholder);
    }
}
