//! Cancellable timed wait used by the poller.
//!
//! A [`TimedWait`] hands out "ticks": the first one immediately, each later
//! one after a full interval sleep. It stops handing out ticks once the
//! timeout has elapsed, checked both before and after the sleep, or the
//! cancellation token fires. The blocking `/ask`
//! path and the bounded `/status` probe both drive the same wait with
//! different timeouts.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Timeout and cadence of a status wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total budget measured from the first tick.
    pub timeout: Duration,
    /// Minimum spacing between two ticks.
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Same cadence with a different budget.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Why a [`TimedWait`] stopped handing out ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStop {
    /// The budget ran out; carries the time waited so far.
    Expired(Duration),
    /// The cancellation token fired.
    Cancelled,
}

#[derive(Debug)]
pub struct TimedWait<'a> {
    policy: PollPolicy,
    cancel: &'a CancellationToken,
    started: Instant,
    ticks: u32,
}

impl<'a> TimedWait<'a> {
    pub fn start(policy: PollPolicy, cancel: &'a CancellationToken) -> Self {
        Self {
            policy,
            cancel,
            started: Instant::now(),
            ticks: 0,
        }
    }

    /// Wait for permission to issue the next probe.
    pub async fn tick(&mut self) -> Result<(), WaitStop> {
        if self.cancel.is_cancelled() {
            return Err(WaitStop::Cancelled);
        }

        if self.ticks > 0 {
            let waited = self.started.elapsed();
            if waited >= self.policy.timeout {
                return Err(WaitStop::Expired(waited));
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(WaitStop::Cancelled),
                () = tokio::time::sleep(self.policy.interval) => {}
            }

            // No probe goes out past the deadline.
            let waited = self.started.elapsed();
            if waited >= self.policy.timeout {
                return Err(WaitStop::Expired(waited));
            }
        }

        self.ticks += 1;
        Ok(())
    }

    /// Drive `fut` unless the wait is cancelled first.
    ///
    /// A cancelled future is dropped, which abandons any in-flight request.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, WaitStop> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(WaitStop::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Ticks handed out so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(timeout_ms: u64, interval_ms: u64) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(5_000, 1_000), &cancel);

        wait.tick().await.unwrap();
        assert_eq!(wait.elapsed(), Duration::ZERO);
        assert_eq!(wait.ticks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_ticks_wait_a_full_interval() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(5_000, 1_000), &cancel);

        wait.tick().await.unwrap();
        wait.tick().await.unwrap();
        assert_eq!(wait.elapsed(), Duration::from_millis(1_000));
        wait.tick().await.unwrap();
        assert_eq!(wait.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_within_timeout_plus_interval() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(2_500, 1_000), &cancel);

        let stop = loop {
            if let Err(stop) = wait.tick().await {
                break stop;
            }
        };

        assert_eq!(stop, WaitStop::Expired(Duration::from_millis(3_000)));
        assert_eq!(wait.ticks(), 3);
        assert!(wait.elapsed() < Duration::from_millis(3_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_granted_after_deadline() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(2_000, 1_000), &cancel);

        wait.tick().await.unwrap();
        wait.tick().await.unwrap();
        // The sleep ends exactly on the deadline.
        assert_eq!(
            wait.tick().await,
            Err(WaitStop::Expired(Duration::from_millis(2_000)))
        );
        assert_eq!(wait.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_allows_exactly_one_tick() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(0, 1_000), &cancel);

        assert!(wait.tick().await.is_ok());
        assert_eq!(wait.tick().await, Err(WaitStop::Expired(Duration::ZERO)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let cancel = CancellationToken::new();
        let mut wait = TimedWait::start(policy(60_000, 10_000), &cancel);
        wait.tick().await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        assert_eq!(wait.tick().await, Err(WaitStop::Cancelled));
        assert_eq!(wait.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_guard_drops_future_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let wait = TimedWait::start(policy(1_000, 100), &cancel);

        let out = wait.guard(std::future::pending::<()>()).await;
        assert_eq!(out, Err(WaitStop::Cancelled));
    }
}
