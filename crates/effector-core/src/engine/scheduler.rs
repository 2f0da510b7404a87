//! Engine - primitive を tokio task として起動する
//!
//! 1 インスタンス = 1 task。Engine が持つのは共有状態だけです：
//! - GroupLockRegistry（group ごとの occupant）
//! - arrival カウンタ（group 内の到着順）
//! - EventSink / IdGenerator

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;
use tracing::debug;

use super::handle::{self, EffectHandle, InstanceSide};
use super::instance::InstanceCore;
use super::periodic::{self, Periodic};
use super::registry::GroupLockRegistry;
use super::one_shot::{self, OneShot};
use super::timed::{self, TimedHold};
use crate::domain::{Group, Phase, RequestId, Termination};
use crate::ports::{EventSink, IdGenerator, SystemClock, UlidGenerator};

/// Spawns primitive instances and owns the state they share.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<GroupLockRegistry>,
    events: Arc<dyn EventSink>,
    ids: Arc<dyn IdGenerator>,
    arrivals: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self::with_ids(events, Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_ids(events: Arc<dyn EventSink>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            registry: Arc::new(GroupLockRegistry::new()),
            events,
            ids,
            arrivals: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn registry(&self) -> &Arc<GroupLockRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    pub fn ids(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    /// One-shots never hold a group.
    pub fn spawn_one_shot(&self, request: RequestId, spec: OneShot) -> EffectHandle {
        self.spawn_with(request, None, Phase::Waiting, move |core, at| {
            one_shot::run(core, spec, at)
        })
    }

    pub fn spawn_timed(&self, request: RequestId, spec: TimedHold) -> EffectHandle {
        let group = spec.group.clone();
        self.spawn_with(request, group, Phase::Waiting, move |core, at| {
            timed::run(core, spec, at)
        })
    }

    pub fn spawn_periodic<S: Send + 'static>(
        &self,
        request: RequestId,
        spec: Periodic<S>,
    ) -> EffectHandle {
        let group = spec.group.clone();
        self.spawn_with(request, group, Phase::Setup, move |core, at| {
            periodic::run(core, spec, at)
        })
    }

    fn spawn_with<F, Fut>(
        &self,
        request: RequestId,
        group: Option<Group>,
        phase: Phase,
        body: F,
    ) -> EffectHandle
    where
        F: FnOnce(InstanceCore, Instant) -> Fut,
        Fut: Future<Output = Termination> + Send + 'static,
    {
        let instance = self.ids.generate_instance_id();
        // Arrival order is fixed at spawn, not when the group is later claimed.
        let arrival = self.arrivals.fetch_add(1, Ordering::SeqCst);
        let (handle, side): (EffectHandle, InstanceSide) = handle::channel(instance, request, phase);

        debug!(%instance, %request, arrival, group = ?group, "spawning effect instance");
        let core = InstanceCore::new(
            handle.clone(),
            side,
            arrival,
            group,
            Arc::clone(&self.registry),
            Arc::clone(&self.events),
        );
        tokio::spawn(body(core, Instant::now()));
        handle
    }
}
