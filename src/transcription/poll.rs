//! Poll loop policy and the sleep primitive it waits on between attempts.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Bounds for one result poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Requests issued before the loop reports "not ready".
    pub max_attempts: u32,
    /// Pause between two consecutive requests.
    pub interval: Duration,
}

impl Default for PollPolicy {
    /// 300 attempts at 2s: roughly ten minutes per encoding.
    fn default() -> Self {
        Self {
            max_attempts: 300,
            interval: Duration::from_secs(2),
        }
    }
}

/// Waits between poll attempts, allowing tests to observe or skip the wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and counts how often it was asked to wait.
#[derive(Debug, Default)]
pub struct CountingSleeper {
    calls: AtomicU32,
}

impl CountingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
