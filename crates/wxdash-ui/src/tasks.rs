//! Latest-wins background tasks.
//!
//! Every background job the controller starts (forecast load, suggestion
//! lookup, geolocation request, debounce timer) lives in a [`TaskSlot`].
//! Starting a job cancels the slot's previous one and hands out a new
//! sequence number; completions report that number back and are only applied
//! while it is still current.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct TaskSlot {
    seq: u64,
    token: Option<CancellationToken>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the running job, if any, and reserve a new sequence number.
    pub fn start(&mut self) -> (u64, CancellationToken) {
        self.cancel();
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        (self.seq, token)
    }

    /// Cancel the running job and invalidate its sequence number.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.seq += 1;
    }

    /// Whether a completion tagged `seq` belongs to the newest job.
    /// Consumes the slot so the same completion is applied at most once.
    pub fn finish(&mut self, seq: u64) -> bool {
        if seq == self.seq && self.token.is_some() {
            self.token = None;
            true
        } else {
            false
        }
    }

    /// Run `job` on the runtime and send `wrap(seq, output)` when it finishes,
    /// unless a newer job cancels it first.
    pub fn spawn<T, M, F, W>(&mut self, tx: &UnboundedSender<M>, job: F, wrap: W)
    where
        F: Future<Output = T> + Send + 'static,
        W: FnOnce(u64, T) -> M + Send + 'static,
        T: Send + 'static,
        M: Send + 'static,
    {
        let (seq, token) = self.start();
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("Task {} cancelled", seq);
                }
                output = job => {
                    // Receiver gone means the controller shut down
                    let _ = tx.send(wrap(seq, output));
                }
            }
        });
    }
}

/// Fires once per quiet period: every [`Debouncer::schedule`] call restarts
/// the timer.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: TaskSlot,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: TaskSlot::new(),
        }
    }

    /// Restart the timer; when it elapses `wrap(seq)` is sent.
    pub fn schedule<M: Send + 'static>(&mut self, tx: &UnboundedSender<M>, wrap: fn(u64) -> M) {
        let delay = self.delay;
        self.slot
            .spawn(tx, tokio::time::sleep(delay), move |seq, ()| wrap(seq));
    }

    /// Whether the elapsed timer `seq` is the one most recently scheduled
    pub fn fired(&mut self, seq: u64) -> bool {
        self.slot.finish(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_slot_only_accepts_latest() {
        let mut slot = TaskSlot::new();
        let (first, first_token) = slot.start();
        let (second, _) = slot.start();

        assert!(first_token.is_cancelled());
        assert!(!slot.finish(first));
        assert!(slot.finish(second));
        // Second delivery of the same completion is ignored
        assert!(!slot.finish(second));
    }

    #[test]
    fn test_cancel_invalidates_running_job() {
        let mut slot = TaskSlot::new();
        let (seq, token) = slot.start();
        slot.cancel();
        assert!(token.is_cancelled());
        assert!(!slot.finish(seq));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_delivers_output() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TaskSlot::new();
        slot.spawn(&tx, async { 7 }, |seq, n: i32| (seq, n));

        let (seq, n) = rx.recv().await.unwrap();
        assert_eq!(n, 7);
        assert!(slot.finish(seq));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_spawn_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = TaskSlot::new();
        slot.spawn(
            &tx,
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "slow"
            },
            |seq, s: &'static str| (seq, s),
        );
        slot.spawn(&tx, async { "fast" }, |seq, s: &'static str| (seq, s));

        let (_, first) = rx.recv().await.unwrap();
        assert_eq!(first, "fast");
        let nothing = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_fires_once_after_quiet_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        for _ in 0..5 {
            debouncer.schedule(&tx, |seq| seq);
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        let started = tokio::time::Instant::now();
        let seq = rx.recv().await.unwrap();
        assert!(debouncer.fired(seq));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(200) && waited < Duration::from_millis(300));

        let nothing = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(nothing.is_err());
    }
}
