//! EffectHandle - 実行中インスタンスへの外側からのハンドル
//!
//! - `cancel()` は停止を要求し、completion hook が走り終わるまで待つ
//! - `wait()` は終了を待つだけ
//!
//! 停止要求は `watch` チャネルで届けます（ワーカーの shutdown と同じ方式）。

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{CancelReason, EffectStatus, InstanceId, Phase, RequestId, Termination};

/// Cloneable handle to one primitive instance.
#[derive(Clone)]
pub struct EffectHandle {
    id: InstanceId,
    request: RequestId,
    cancel_tx: Arc<watch::Sender<Option<CancelReason>>>,
    status_rx: watch::Receiver<EffectStatus>,
}

impl EffectHandle {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn status(&self) -> EffectStatus {
        *self.status_rx.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.status().phase
    }

    pub fn termination(&self) -> Option<Termination> {
        self.status().termination
    }

    pub fn is_finished(&self) -> bool {
        self.termination().is_some()
    }

    /// Ask the instance to stop without waiting for it.
    ///
    /// The first reason wins; returns `false` if a stop was already requested.
    pub fn request_cancel(&self, reason: CancelReason) -> bool {
        self.cancel_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        })
    }

    /// Stop the instance and wait until its completion hook (if owed) has run.
    ///
    /// Returns the termination the instance actually reached, which may differ
    /// from `reason` if it had already finished on its own.
    pub async fn cancel(&self, reason: CancelReason) -> Termination {
        self.request_cancel(reason);
        self.wait().await
    }

    /// Wait for the instance to reach `Completed`.
    pub async fn wait(&self) -> Termination {
        let mut rx = self.status_rx.clone();
        loop {
            let termination = rx.borrow_and_update().termination;
            if let Some(termination) = termination {
                return termination;
            }
            if rx.changed().await.is_err() {
                // The instance went away without publishing (its task panicked).
                return rx.borrow().termination.unwrap_or(Termination::Aborted);
            }
        }
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("status", &self.status())
            .finish()
    }
}

/// The instance's side of the handle.
pub(crate) struct InstanceSide {
    pub(crate) cancel: CancelSignal,
    pub(crate) status_tx: watch::Sender<EffectStatus>,
}

/// Create a handle and the matching instance side.
pub(crate) fn channel(
    id: InstanceId,
    request: RequestId,
    phase: Phase,
) -> (EffectHandle, InstanceSide) {
    let (cancel_tx, cancel_rx) = watch::channel(None);
    let cancel_tx = Arc::new(cancel_tx);
    let (status_tx, status_rx) = watch::channel(EffectStatus::new(phase));

    let handle = EffectHandle {
        id,
        request,
        cancel_tx: Arc::clone(&cancel_tx),
        status_rx,
    };
    let side = InstanceSide {
        cancel: CancelSignal {
            rx: cancel_rx,
            _keepalive: cancel_tx,
        },
        status_tx,
    };
    (handle, side)
}

/// Cancellation as seen from inside an instance.
///
/// Every suspension point goes through [`CancelSignal::sleep_until`], so a stop
/// is observed at the next wait at the latest.
pub(crate) struct CancelSignal {
    rx: watch::Receiver<Option<CancelReason>>,
    // Keeps the channel open even when every handle has been dropped.
    _keepalive: Arc<watch::Sender<Option<CancelReason>>>,
}

impl CancelSignal {
    pub(crate) fn requested(&self) -> Option<CancelReason> {
        *self.rx.borrow()
    }

    async fn cancelled(&mut self) -> CancelReason {
        loop {
            let requested = *self.rx.borrow_and_update();
            if let Some(reason) = requested {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    pub(crate) async fn sleep_until(&mut self, deadline: Instant) -> Result<(), CancelReason> {
        tokio::select! {
            biased;
            reason = self.cancelled() => Err(reason),
            _ = tokio::time::sleep_until(deadline) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn pair() -> (EffectHandle, InstanceSide) {
        channel(InstanceId::generate(), RequestId::generate(), Phase::Waiting)
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_cancel() {
        let (_handle, mut side) = pair();
        let start = Instant::now();
        assert_eq!(side.cancel.sleep_until(start + Duration::from_secs(3)).await, Ok(()));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_sleep() {
        let (handle, mut side) = pair();
        let sleeper = tokio::spawn(async move {
            let result = side.cancel.sleep_until(Instant::now() + Duration::from_secs(60)).await;
            (result, side)
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.request_cancel(CancelReason::Stopped));
        let (result, _side) = sleeper.await.unwrap();
        assert_eq!(result, Err(CancelReason::Stopped));
    }

    #[test]
    fn first_cancel_reason_wins() {
        let (handle, side) = pair();
        assert!(handle.request_cancel(CancelReason::Superseded));
        assert!(!handle.request_cancel(CancelReason::Stopped));
        assert_eq!(side.cancel.requested(), Some(CancelReason::Superseded));
    }

    #[tokio::test]
    async fn wait_returns_published_termination() {
        let (handle, side) = pair();
        side.status_tx.send_modify(|status| {
            status.phase = Phase::Completed;
            status.termination = Some(Termination::Expired);
        });
        assert_eq!(handle.wait().await, Termination::Expired);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn wait_reports_aborted_when_instance_vanishes() {
        let (handle, side) = pair();
        drop(side);
        assert_eq!(handle.wait().await, Termination::Aborted);
    }
}
