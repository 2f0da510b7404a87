//! Periodic-tick: re-assert every interval for a duration.
//!
//! For state the target process keeps recalculating: one write does not stick,
//! so the tick writes again until the duration is over, then the hook restores
//! the game's own behavior.
//!
//! State transitions:
//! - Setup -> Ticking -> Completed (Expired / Aborted / Cancelled / Superseded)
//! - Setup -> Completed (TimedOut / Cancelled / Superseded / Stale), no hook
//!
//! Tick-to-tick memory is the `S` value threaded through every tick; it lives
//! in this instance only.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::hook::{CompletionHook, Precondition, TickAction, TickResult};
use super::instance::InstanceCore;
use super::{RepeatPolicy, RetryPolicy, TickFailure};
use crate::domain::{Group, Phase, Termination};

/// Parameters of a periodic effect.
pub struct Periodic<S> {
    pub(crate) precondition: Precondition,
    pub(crate) setup: Box<dyn FnMut() -> Option<S> + Send>,
    pub(crate) tick: TickAction<S>,
    pub(crate) duration: Duration,
    pub(crate) group: Option<Group>,
    pub(crate) on_complete: CompletionHook,
    pub(crate) repeat: RepeatPolicy,
    pub(crate) setup_timeout: Option<Duration>,
}

impl<S: Send + 'static> Periodic<S> {
    /// `setup` returns the initial tick state, or `None` when it failed and
    /// must be retried.
    pub fn new(
        setup: impl FnMut() -> Option<S> + Send + 'static,
        tick: impl FnMut(S) -> TickResult<S> + Send + 'static,
        duration: Duration,
    ) -> Self {
        Self {
            precondition: Box::new(|| true),
            setup: Box::new(setup),
            tick: Box::new(tick),
            duration,
            group: None,
            on_complete: CompletionHook::noop(),
            repeat: RepeatPolicy::default(),
            setup_timeout: None,
        }
    }

    /// Setup action that carries no state beyond success.
    pub fn stateless(
        mut setup: impl FnMut() -> bool + Send + 'static,
        mut tick: impl FnMut() -> bool + Send + 'static,
        duration: Duration,
    ) -> Periodic<()> {
        Periodic::new(
            move || setup().then_some(()),
            move |()| TickResult::new((), tick()),
            duration,
        )
    }

    /// Gate for the setup action (default: always true).
    pub fn precondition(mut self, precondition: impl Fn() -> bool + Send + 'static) -> Self {
        self.precondition = Box::new(precondition);
        self
    }

    pub fn group(mut self, group: impl Into<Option<Group>>) -> Self {
        self.group = group.into();
        self
    }

    pub fn on_complete(mut self, hook: CompletionHook) -> Self {
        self.on_complete = hook;
        self
    }

    pub fn repeat(mut self, repeat: RepeatPolicy) -> Self {
        self.repeat = repeat;
        self
    }

    /// Bound on the setup phase.
    pub fn setup_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.setup_timeout = timeout.into();
        self
    }

    /// Take the setup bound from a retry policy (its delay is not used).
    pub fn retry(self, retry: RetryPolicy) -> Self {
        self.setup_timeout(retry.timeout)
    }
}

pub(crate) async fn run<S: Send + 'static>(
    mut core: InstanceCore,
    spec: Periodic<S>,
    spawned_at: Instant,
) -> Termination {
    let Periodic {
        precondition,
        mut setup,
        mut tick,
        duration,
        on_complete,
        repeat,
        setup_timeout,
        ..
    } = spec;
    let setup_deadline = setup_timeout.map(|timeout| spawned_at + timeout);
    core.set_phase(Phase::Setup);

    // Setup
    let mut state = loop {
        if let Some(reason) = core.cancel_requested() {
            return core.finish(reason.into(), None);
        }
        if setup_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return core.finish(Termination::TimedOut, None);
        }

        if precondition() {
            if let Err(termination) = core.claim_group().await {
                return core.finish(termination, None);
            }
            if let Some(reason) = core.cancel_requested() {
                return core.finish(reason.into(), None);
            }
            if !core.still_holds() {
                return core.finish(Termination::Superseded, None);
            }
            if let Some(initial) = setup() {
                break initial;
            }
        }

        let mut wake = Instant::now() + repeat.setup_delay;
        if let Some(deadline) = setup_deadline {
            wake = wake.min(deadline);
        }
        if let Err(reason) = core.pause_until(wake).await {
            return core.finish(reason.into(), None);
        }
    };

    // Ticking
    core.activated(Phase::Ticking);
    let mut deadline = Instant::now() + duration;
    let mut extended = Duration::ZERO;
    let mut ticks: u64 = 0;

    let termination = loop {
        let now = Instant::now();
        if now >= deadline {
            break Termination::Expired;
        }
        let wake = (now + repeat.interval).min(deadline);
        if let Err(reason) = core.pause_until(wake).await {
            break reason.into();
        }
        if Instant::now() >= deadline {
            break Termination::Expired;
        }
        if !core.still_holds() {
            break Termination::Superseded;
        }

        let TickResult { state: next, ok } = tick(state);
        state = next;
        ticks += 1;
        if ok {
            continue;
        }

        match repeat.on_tick_failure {
            TickFailure::Continue => {}
            TickFailure::Extend => {
                if extended < duration {
                    let bump = repeat.interval.min(duration - extended);
                    extended += bump;
                    deadline += bump;
                }
            }
            TickFailure::Abort => {
                debug!(instance = %core.id(), ticks, "tick failed, aborting");
                break Termination::Aborted;
            }
        }
    };

    debug!(instance = %core.id(), ticks, extended_ms = extended.as_millis() as u64, "ticking stopped");
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

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn setup_runs_once_before_first_tick() {
        let engine = engine();
        let log = Arc::new(Mutex::new(Vec::<String>::new()));

        let l_setup = Arc::clone(&log);
        let l_tick = Arc::clone(&log);
        let l_hook = Arc::clone(&log);
        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::new(
                move || {
                    l_setup.lock().unwrap().push("setup".to_string());
                    Some(0u32)
                },
                move |n: u32| {
                    l_tick.lock().unwrap().push(format!("tick{n}"));
                    TickResult::new(n + 1, true)
                },
                secs(5),
            )
            .repeat(RepeatPolicy::new(secs(1), secs(1)))
            .on_complete(CompletionHook::new(move || {
                l_hook.lock().unwrap().push("hook".to_string());
            })),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup", "tick0", "tick1", "tick2", "tick3", "hook"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_setup_succeeds() {
        let engine = engine();
        let setups = Arc::new(AtomicU32::new(0));
        let ticks = Arc::new(AtomicU32::new(0));
        let ready = Arc::new(AtomicBool::new(false));

        let s = Arc::clone(&setups);
        let r = Arc::clone(&ready);
        let t = Arc::clone(&ticks);
        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(
                move || {
                    s.fetch_add(1, Ordering::SeqCst);
                    r.load(Ordering::SeqCst)
                },
                move || {
                    t.fetch_add(1, Ordering::SeqCst);
                    true
                },
                secs(10),
            ),
        );

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(handle.phase(), Phase::Setup);
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert_eq!(setups.load(Ordering::SeqCst), 5);

        ready.store(true, Ordering::SeqCst);
        tokio::time::sleep(secs(1)).await;
        assert_eq!(handle.phase(), Phase::Ticking);
        assert_eq!(setups.load(Ordering::SeqCst), 6);

        assert_eq!(handle.cancel(CancelReason::Stopped).await, Termination::Cancelled);
        assert!(handle.status().hook_ran);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_continue_by_default() {
        let engine = engine();
        let ticks = Arc::new(AtomicU32::new(0));
        let t = Arc::clone(&ticks);

        let start = Instant::now();
        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(
                || true,
                move || {
                    t.fetch_add(1, Ordering::SeqCst);
                    false
                },
                secs(10),
            ),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(start.elapsed(), secs(10));
        assert_eq!(ticks.load(Ordering::SeqCst), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_extend_when_reset_is_set() {
        let engine = engine();
        let ticks = Arc::new(AtomicU32::new(0));
        let t = Arc::clone(&ticks);

        let start = Instant::now();
        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(
                || true,
                // the first three ticks miss
                move || t.fetch_add(1, Ordering::SeqCst) >= 3,
                secs(10),
            )
            .repeat(RepeatPolicy::new(secs(1), secs(1)).reset_on_tick_failure(true)),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(start.elapsed(), secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn extension_is_capped_at_one_duration() {
        let engine = engine();
        let start = Instant::now();
        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(|| true, || false, secs(5))
                .repeat(RepeatPolicy::new(secs(1), secs(1)).on_tick_failure(TickFailure::Extend)),
        );

        assert_eq!(handle.wait().await, Termination::Expired);
        assert_eq!(start.elapsed(), secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_policy_ends_effect_and_runs_hook() {
        let engine = engine();
        let hooks = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hooks);

        let handle = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(|| true, || false, secs(60))
                .repeat(RepeatPolicy::new(secs(1), secs(1)).on_tick_failure(TickFailure::Abort))
                .on_complete(CompletionHook::new(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                })),
        );

        assert_eq!(handle.wait().await, Termination::Aborted);
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_instances_keep_their_own_state() {
        let engine = engine();
        let seen = Arc::new(Mutex::new(Vec::<(u8, u32)>::new()));

        let spawn = |tag: u8, step: u32| {
            let seen = Arc::clone(&seen);
            engine.spawn_periodic(
                RequestId::generate(),
                Periodic::new(
                    move || Some(0u32),
                    move |n: u32| {
                        seen.lock().unwrap().push((tag, n));
                        TickResult::new(n + step, true)
                    },
                    secs(4),
                ),
            )
        };
        let a = spawn(1, 1);
        let b = spawn(2, 10);

        assert_eq!(a.wait().await, Termination::Expired);
        assert_eq!(b.wait().await, Termination::Expired);

        let seen = seen.lock().unwrap();
        let a_states: Vec<u32> = seen.iter().filter(|(t, _)| *t == 1).map(|(_, n)| *n).collect();
        let b_states: Vec<u32> = seen.iter().filter(|(t, _)| *t == 2).map(|(_, n)| *n).collect();
        assert_eq!(a_states, vec![0, 1, 2]);
        assert_eq!(b_states, vec![0, 10, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_periodic_stops_ticking() {
        let engine = engine();
        let size = Group::new("briansize");
        let first_ticks = Arc::new(AtomicU32::new(0));
        let t = Arc::clone(&first_ticks);

        let first = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(
                || true,
                move || {
                    t.fetch_add(1, Ordering::SeqCst);
                    true
                },
                secs(60),
            )
            .group(size.clone()),
        );
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let second = engine.spawn_periodic(
            RequestId::generate(),
            Periodic::<()>::stateless(|| true, || true, secs(60)).group(size.clone()),
        );
        assert_eq!(first.wait().await, Termination::Superseded);
        assert!(first.status().hook_ran);
        let frozen = first_ticks.load(Ordering::SeqCst);
        assert_eq!(frozen, 3);

        tokio::time::sleep(secs(5)).await;
        assert_eq!(first_ticks.load(Ordering::SeqCst), frozen);
        assert_eq!(second.phase(), Phase::Ticking);
    }
}
