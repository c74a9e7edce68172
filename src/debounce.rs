use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A run that is waiting out its quiet period.
struct Pending {
    /// Dropping this wakes the waiting task and makes it bail out.
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Trailing-edge debouncer.
///
/// Every [`schedule`](Debouncer::schedule) replaces the previous pending
/// callback and restarts the quiet period, so a burst of triggers runs only
/// the last callback, once, `delay` after the last trigger. Dropping the
/// debouncer cancels whatever is still waiting.
///
/// A callback whose quiet period has already elapsed is running, not
/// pending; later `schedule`/`cancel` calls do not interrupt it.
///
/// Must be used from inside a tokio runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start (or reset) the quiet period with `callback` as the run to fire.
    pub fn schedule<F, Fut>(&mut self, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let (cancel, mut cancelled) = oneshot::channel::<()>();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                // Sender dropped or fired: either way this run is superseded.
                _ = &mut cancelled => return,
                _ = tokio::time::sleep(delay) => {}
            }
            callback().await;
        });
        tracing::trace!(delay_ms = delay.as_millis() as u64, "debounce scheduled");
        self.pending = Some(Pending { cancel, handle });
    }

    /// Drop the pending run, if any. Returns whether a run was still outstanding.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.handle.is_finished() => {
                let _ = pending.cancel.send(());
                true
            }
            _ => false,
        }
    }

    /// True while a scheduled callback has not yet finished.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if self.cancel() {
            tracing::debug!("debouncer dropped with a pending run; cancelled");
        }
    }
}
