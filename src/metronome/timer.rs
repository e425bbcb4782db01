//! Tokio-backed [`TimerSource`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::scheduler::TimerSource;

/// Expiration notice sent to the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerElapsed {
    pub generation: u64,
}

/// Runs each armed cadence as a spawned task feeding an unbounded channel.
///
/// Late ticks are skipped rather than bursted, so a stalled loop never
/// replays missed clicks. Must be armed from within a tokio runtime.
pub struct TokioTimer {
    tx: mpsc::UnboundedSender<TimerElapsed>,
    task: Option<JoinHandle<()>>,
}

impl TokioTimer {
    /// Create the timer together with the receiver the event loop listens on.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerElapsed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, task: None }, rx)
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl TimerSource for TokioTimer {
    fn arm(&mut self, interval: Duration, generation: u64) {
        self.disarm();

        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            // The scheduler already emitted the immediate tick
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(TimerElapsed { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_after_each_interval() {
        let (mut timer, mut rx) = TokioTimer::new();
        let start = Instant::now();
        timer.arm(Duration::from_millis(500), 7);

        for n in 1..=3 {
            let elapsed = rx.recv().await.unwrap();
            assert_eq!(elapsed.generation, 7);
            assert_close(start.elapsed(), Duration::from_millis(500 * n));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_reports() {
        let (mut timer, mut rx) = TokioTimer::new();
        timer.arm(Duration::from_millis(100), 1);
        assert!(rx.recv().await.is_some());

        timer.disarm();
        assert!(!timer.is_armed());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_cadence() {
        let (mut timer, mut rx) = TokioTimer::new();
        timer.arm(Duration::from_millis(100), 1);
        timer.arm(Duration::from_millis(300), 2);

        let start = Instant::now();
        let elapsed = rx.recv().await.unwrap();
        assert_eq!(elapsed.generation, 2);
        assert_close(start.elapsed(), Duration::from_millis(300));
    }
}
