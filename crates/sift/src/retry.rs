//! 🔁 Bounded linear backoff, as an explicit state machine.
//!
//! ```text
//!   Pending ──ok──▶ Done
//!      │
//!     err
//!      ▼
//!   Retry(1) ──ok──▶ Done          sleep 1 × base before the call
//!      │
//!     err
//!      ▼
//!     ...
//!   Retry(max) ──err──▶ Abandoned
//! ```
//!
//! [`WriteState::advance`] is pure: feed it the outcome of the attempt the state
//! describes, get the next state back. [`write_with_backoff`] is the only part that
//! touches a clock. Every failure is treated the same. The store is eventually
//! consistent and we have no way to tell "later" from "never".

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

/// 🔧 How stubborn the reducer is.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// retries after the first attempt; a doomed write makes `max_retries + 1` calls
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// the delay before retry `n` is `n × base_delay_ms`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// ⏳ Linear, not exponential. Retry 3 waits three base delays.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// 🚦 Where one write currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteState {
    Pending,
    Retry(u32),
    Done { attempts: u32 },
    Abandoned { attempts: u32, last_error: String },
}

impl WriteState {
    /// ➡️ The attempt described by `self` came back with `result`. What now?
    ///
    /// Terminal states stay put no matter what you feed them.
    pub fn advance(self, result: Result<()>, policy: &RetryPolicy) -> WriteState {
        let retries_so_far = match self {
            WriteState::Pending => 0,
            WriteState::Retry(n) => n,
            terminal => return terminal,
        };
        let attempts = retries_so_far + 1;
        match result {
            Ok(()) => WriteState::Done { attempts },
            Err(_) if retries_so_far < policy.max_retries => WriteState::Retry(retries_so_far + 1),
            Err(err) => WriteState::Abandoned {
                attempts,
                last_error: format!("{err:#}"),
            },
        }
    }
}

/// 🏁 How a write ended. Both are "handled"; only one of them is good news.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Done { attempts: u32 },
    Abandoned { attempts: u32, last_error: String },
}

/// 🔁 Drive `attempt` through the state machine, sleeping between tries.
///
/// Never returns an error: exhaustion is an outcome, not a failure.
pub async fn write_with_backoff<F, Fut>(policy: &RetryPolicy, mut attempt: F) -> WriteOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut state = WriteState::Pending;
    loop {
        let result = attempt().await;
        if let Err(err) = &result {
            debug!("🔁 write attempt failed while {state:?}: {err:#}");
        }
        state = state.advance(result, policy);
        match &state {
            WriteState::Retry(n) => {
                let delay = policy.delay_before_retry(*n);
                debug!("⏳ backing off {delay:?} before retry #{n}");
                tokio::time::sleep(delay).await;
            }
            WriteState::Done { attempts } => {
                return WriteOutcome::Done {
                    attempts: *attempts,
                };
            }
            WriteState::Abandoned {
                attempts,
                last_error,
            } => {
                return WriteOutcome::Abandoned {
                    attempts: *attempts,
                    last_error: last_error.clone(),
                };
            }
            // -- advance never goes back to Pending
            WriteState::Pending => {}
        }
    }
}
