//! Gated-timed-hold: apply, hold for a duration, then always revert.
//!
//! State transitions:
//! - Waiting -> Active -> Completed (Expired / Cancelled / Superseded)
//! - Waiting -> Completed (TimedOut / Cancelled / Superseded / Stale), no hook
//!
//! The hook runs iff the action ever succeeded.

use std::time::Duration;

use tokio::time::Instant;

use super::hook::{Action, CompletionHook, Precondition};
use super::instance::InstanceCore;
use super::RetryPolicy;
use crate::domain::{Group, Phase, Termination};

/// Parameters of a timed-hold effect.
pub struct TimedHold {
    pub(crate) precondition: Precondition,
    pub(crate) action: Action,
    pub(crate) duration: Duration,
    pub(crate) group: Option<Group>,
    pub(crate) on_complete: CompletionHook,
    pub(crate) retry: RetryPolicy,
}

impl TimedHold {
    pub fn new(
        precondition: impl Fn() -> bool + Send + 'static,
        action: impl FnMut() -> bool + Send + 'static,
        duration: Duration,
    ) -> Self {
        Self {
            precondition: Box::new(precondition),
            action: Box::new(action),
            duration,
            group: None,
            on_complete: CompletionHook::noop(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn group(mut self, group: impl Into<Option<Group>>) -> Self {
        self.group = group.into();
        self
    }

    pub fn on_complete(mut self, hook: CompletionHook) -> Self {
        self.on_complete = hook;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

pub(crate) async fn run(mut core: InstanceCore, spec: TimedHold, spawned_at: Instant) -> Termination {
    let TimedHold {
        precondition,
        mut action,
        duration,
        on_complete,
        retry,
        ..
    } = spec;
    let wait_deadline = retry.timeout.map(|timeout| spawned_at + timeout);
    core.set_phase(Phase::Waiting);

    // Waiting
    loop {
        if let Some(reason) = core.cancel_requested() {
            return core.finish(reason.into(), None);
        }
        if wait_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return core.finish(Termination::TimedOut, None);
        }

        if precondition() {
            if let Err(termination) = core.claim_group().await {
                return core.finish(termination, None);
            }
            // Superseding may have taken a while; a stop that arrived meanwhile wins.
            if let Some(reason) = core.cancel_requested() {
                return core.finish(reason.into(), None);
            }
            if !core.still_holds() {
                return core.finish(Termination::Superseded, None);
            }
            if action() {
                break;
            }
        }

        let mut wake = Instant::now() + retry.delay;
        if let Some(deadline) = wait_deadline {
            wake = wake.min(deadline);
        }
        if let Err(reason) = core.pause_until(wake).await {
            return core.finish(reason.into(), None);
        }
    }

    // Active
    core.activated(Phase::Active);
    let expires_at = Instant::now() + duration;
    let termination = match core.pause_until(expires_at).await {
        Ok(()) => Termination::Expired,
        Err(reason) => reason.into(),
    };
    core.finish(termination, Some(on_complete))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::{CancelReason, RequestId};
    use crate::engine::Engine;
    use crate::impls::RecordingEventSink;

    fn engine() -> Engine {
        Engine::new(Arc::new(RecordingEventSink::new()))
    }

    fn counter() -> (Arc<AtomicU32>, impl FnMut() -> bool + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn hook_runs_once_after_duration() {
        let engine = engine();
        let (actions, action) = counter();
        let hooks = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hooks);

        let start = Instant::now();
        let handle = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| true, action, Duration::from_secs(60)).on_complete(
                CompletionHook::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            ),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(actions.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
        assert!(handle.status().hook_ran);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_in_active_runs_hook_before_returning() {
        let engine = engine();
        let (_actions, action) = counter();
        let reverted = Arc::new(AtomicBool::new(false));
        let r = Arc::clone(&reverted);

        let handle = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| true, action, Duration::from_secs(60))
                .on_complete(CompletionHook::new(move || r.store(true, Ordering::SeqCst))),
        );
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.phase(), Phase::Active);

        assert_eq!(handle.cancel(CancelReason::Stopped).await, Termination::Cancelled);
        assert!(reverted.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting_skips_hook() {
        let engine = engine();
        let (actions, action) = counter();
        let hooks = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hooks);

        let handle = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| false, action, Duration::from_secs(60)).on_complete(
                CompletionHook::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            ),
        );
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.phase(), Phase::Waiting);

        assert_eq!(handle.cancel(CancelReason::Stopped).await, Termination::Cancelled);
        assert_eq!(actions.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.load(Ordering::SeqCst), 0);
        assert!(!handle.status().hook_ran);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_phase_times_out_without_hook() {
        let engine = engine();
        let hooks = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hooks);

        let handle = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| false, || true, Duration::from_secs(60))
                .retry(RetryPolicy::new(Duration::from_secs(1), Some(Duration::from_secs(5))))
                .on_complete(CompletionHook::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
        );

        assert_eq!(handle.wait().await, Termination::TimedOut);
        assert_eq!(hooks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_action_is_retried_on_cadence() {
        let engine = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let a = Arc::clone(&attempts);

        let start = Instant::now();
        let handle = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(
                || true,
                move || a.fetch_add(1, Ordering::SeqCst) >= 2,
                Duration::from_secs(10),
            )
            .retry(RetryPolicy::new(Duration::from_secs(1), None)),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // two retries (2s) then the 10s hold
        assert_eq!(start.elapsed(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn supersession_reverts_previous_before_next_action() {
        let engine = engine();
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let camera = Group::new("camerafov");

        let l = Arc::clone(&log);
        let l_hook = Arc::clone(&log);
        let first = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(
                || true,
                move || {
                    l.lock().unwrap().push("narrow");
                    true
                },
                Duration::from_secs(60),
            )
            .group(camera.clone())
            .on_complete(CompletionHook::new(move || {
                l_hook.lock().unwrap().push("restore");
            })),
        );
        tokio::time::sleep(Duration::from_secs(10)).await;

        let l = Arc::clone(&log);
        let second = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(
                || true,
                move || {
                    l.lock().unwrap().push("wide");
                    true
                },
                Duration::from_secs(60),
            )
            .group(camera.clone()),
        );

        assert_eq!(first.wait().await, Termination::Superseded);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(second.phase(), Phase::Active);
        assert_eq!(*log.lock().unwrap(), vec!["narrow", "restore", "wide"]);
        assert_eq!(engine.registry().occupant(&camera), Some(second.id()));

        assert_eq!(second.wait().await, Termination::Expired);
        assert_eq!(engine.registry().occupant(&camera), None);
    }

    #[tokio::test(start_paused = true)]
    async fn late_activation_of_older_request_is_stale() {
        let engine = engine();
        let gate = Arc::new(AtomicBool::new(false));
        let g = Arc::clone(&gate);
        let music = Group::new("music");
        let (older_actions, older_action) = counter();

        let older = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(move || g.load(Ordering::SeqCst), older_action, Duration::from_secs(60))
                .group(music.clone()),
        );
        let newer = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| true, || true, Duration::from_secs(60)).group(music.clone()),
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(newer.phase(), Phase::Active);

        gate.store(true, Ordering::SeqCst);
        assert_eq!(older.wait().await, Termination::Stale);
        assert_eq!(older_actions.load(Ordering::SeqCst), 0);
        assert_eq!(newer.phase(), Phase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_request_does_not_block_group() {
        let engine = engine();
        let hud = Group::new("hud");

        let stuck = engine.spawn_timed(
            RequestId::generate(),
            TimedHold::new(|| false, || true, Duration::from_secs(60)).group(hud.clone()),
        );
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(engine.registry().occupant(&hud), None);
        assert_eq!(stuck.phase(), Phase::Waiting);
    }
}
