//! Shared lifecycle plumbing for the three primitives.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use super::handle::{CancelSignal, EffectHandle, InstanceSide};
use super::registry::{Acquire, GroupLockRegistry, Occupant};
use super::CompletionHook;
use crate::domain::{
    CancelReason, EffectEvent, EffectStatus, Group, InstanceId, Phase, RequestId, Termination,
};
use crate::ports::EventSink;

/// One running primitive, from spawn to `Completed`.
///
/// Design:
/// - The group is claimed lazily (`claim_group`), only when the effect is
///   about to take effect.
/// - `finish` is the single exit: hook, release, publish, in that order.
/// - Dropping without `finish` (a panicking action) still releases the group
///   and publishes `Aborted`, so waiters never hang.
pub(crate) struct InstanceCore {
    id: InstanceId,
    request: RequestId,
    arrival: u64,
    group: Option<Group>,
    handle: EffectHandle,
    cancel: CancelSignal,
    status: watch::Sender<EffectStatus>,
    registry: Arc<GroupLockRegistry>,
    events: Arc<dyn EventSink>,
    holds_group: bool,
    finished: bool,
}

impl InstanceCore {
    pub(crate) fn new(
        handle: EffectHandle,
        side: InstanceSide,
        arrival: u64,
        group: Option<Group>,
        registry: Arc<GroupLockRegistry>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id: handle.id(),
            request: handle.request(),
            arrival,
            group,
            handle,
            cancel: side.cancel,
            status: side.status_tx,
            registry,
            events,
            holds_group: false,
            finished: false,
        }
    }

    pub(crate) fn id(&self) -> InstanceId {
        self.id
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.status.send_if_modified(|status| {
            if status.phase == phase {
                false
            } else {
                status.phase = phase;
                true
            }
        });
    }

    pub(crate) fn cancel_requested(&self) -> Option<CancelReason> {
        self.cancel.requested()
    }

    /// Cancelable wait; the only suspension point besides `claim_group`.
    pub(crate) async fn pause_until(&mut self, deadline: Instant) -> Result<(), CancelReason> {
        self.cancel.sleep_until(deadline).await
    }

    /// Take the group, superseding (and waiting out) the previous occupant.
    ///
    /// The wait for the previous occupant is not interruptible: its hook must
    /// finish before anything else touches the group's state.
    pub(crate) async fn claim_group(&mut self) -> Result<(), Termination> {
        if self.holds_group || self.group.is_none() {
            return Ok(());
        }

        let occupant = Occupant {
            instance: self.id,
            arrival: self.arrival,
            handle: self.handle.clone(),
        };
        match self.registry.acquire(self.group.as_ref(), occupant) {
            Acquire::Stale { newer } => {
                info!(
                    instance = %self.id,
                    newer = %newer,
                    group = ?self.group,
                    "newer request already owns group, not applying"
                );
                Err(Termination::Stale)
            }
            Acquire::Granted { previous } => {
                self.holds_group = true;
                if let Some(previous) = previous {
                    info!(
                        instance = %self.id,
                        previous = %previous.id(),
                        group = ?self.group,
                        "superseding active effect"
                    );
                    let outcome = previous.cancel(CancelReason::Superseded).await;
                    debug!(previous = %previous.id(), termination = ?outcome, "previous occupant finished");
                }
                Ok(())
            }
        }
    }

    /// Still the group's occupant (trivially true without a group).
    pub(crate) fn still_holds(&self) -> bool {
        !self.holds_group || self.registry.holds(self.group.as_ref(), self.id)
    }

    pub(crate) fn activated(&self, phase: Phase) {
        self.set_phase(phase);
        info!(instance = %self.id, request = %self.request, group = ?self.group, "effect active");
        self.events.emit(EffectEvent::Activated {
            instance: self.id,
            request: self.request,
            group: self.group.clone(),
        });
    }

    /// Terminal transition: run `hook` (if owed), release the group, publish.
    pub(crate) fn finish(mut self, termination: Termination, hook: Option<CompletionHook>) -> Termination {
        let hook_ran = match hook {
            Some(hook) => {
                hook.run();
                true
            }
            None => false,
        };
        self.release_group();

        self.finished = true;
        self.status.send_modify(|status| {
            status.phase = Phase::Completed;
            status.termination = Some(termination);
            status.hook_ran = hook_ran;
        });
        info!(
            instance = %self.id,
            request = %self.request,
            termination = ?termination,
            hook_ran,
            "effect completed"
        );
        self.events.emit(EffectEvent::Terminated {
            instance: self.id,
            request: self.request,
            termination,
            hook_ran,
        });
        termination
    }

    fn release_group(&mut self) {
        if self.holds_group {
            self.registry.release(self.group.as_ref(), self.id);
            self.holds_group = false;
        }
    }
}

impl Drop for InstanceCore {
    fn drop(&mut self) {
        if !self.finished {
            self.release_group();
            self.status.send_modify(|status| {
                status.phase = Phase::Completed;
                status.termination = Some(Termination::Aborted);
            });
        }
    }
}
