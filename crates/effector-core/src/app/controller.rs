//! Controller - リクエストのライフサイクル
//!
//! # フロー
//! 1. code を parse（失敗したら Rejected を emit して終わり）
//! 2. timing を引いて `EffectRequest` を組み立てる
//! 3. `pack::start` で primitive を起動し、handle を追跡
//! 4. 終了したら reaper task が追跡から外す（Stale なら requester に知らせる）
//!
//! stop / shutdown は handle の `cancel` を使うので、completion hook が
//! 走り終わるまで戻りません。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::Timings;
use super::request::{EffectRequest, RequestSpec};
use crate::domain::{CancelReason, EffectEvent, EngineError, Group, RequestId, Termination};
use crate::engine::EffectHandle;
use crate::pack::{self, EffectCode, EffectContext};
use crate::ports::{Clock, SystemClock};

type ActiveMap = Arc<Mutex<HashMap<RequestId, EffectHandle>>>;

pub struct Controller {
    ctx: EffectContext,
    timings: Timings,
    request_timeout: Duration,
    clock: Arc<dyn Clock>,
    active: ActiveMap,
}

impl Controller {
    pub fn new(ctx: EffectContext, timings: Timings, request_timeout: Duration) -> Self {
        Self {
            ctx,
            timings,
            request_timeout,
            clock: Arc::new(SystemClock),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Clock used for `submitted_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &EffectContext {
        &self.ctx
    }

    fn active_map(&self) -> MutexGuard<'_, HashMap<RequestId, EffectHandle>> {
        lock(&self.active)
    }

    /// Accept a request and start its effect. Must be called inside a tokio runtime.
    pub fn submit(&self, spec: RequestSpec) -> Result<RequestId, EngineError> {
        let request = match self.prepare(&spec) {
            Ok(request) => request,
            Err(err) => {
                warn!(code = %spec.code, requester = %spec.requester, error = %err, "request rejected");
                self.ctx.engine.events().emit(EffectEvent::Rejected {
                    code: spec.code,
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let id = request.id;
        let handle = pack::start(&self.ctx, &request);
        self.active_map().insert(id, handle.clone());
        self.ctx.engine.events().emit(EffectEvent::Accepted {
            request: id,
            code: request.code.to_string(),
        });
        info!(
            request = %id,
            code = %request.code,
            requester = %request.requester,
            group = request.group.as_ref().map_or("-", Group::as_str),
            "request accepted"
        );

        let active = Arc::clone(&self.active);
        let notifier = Arc::clone(&self.ctx.notifier);
        let skipped = format!(
            "{}'s {} was skipped, a newer request took its place",
            request.requester, request.code
        );
        tokio::spawn(async move {
            let termination = handle.wait().await;
            lock(&active).remove(&id);
            if termination == Termination::Stale {
                notifier.notify(&skipped);
            }
            debug!(request = %id, ?termination, "request finished");
        });

        Ok(id)
    }

    fn prepare(&self, spec: &RequestSpec) -> Result<EffectRequest, EngineError> {
        let code: EffectCode = spec.code.parse()?;
        let timing = self
            .timings
            .get(code.kind())
            .ok_or_else(|| EngineError::NoTiming(code.kind().to_string()))?;

        let mut request = EffectRequest::new(
            self.ctx.engine.ids().generate_request_id(),
            code,
            spec.requester.clone(),
            self.clock.now(),
            timing,
            self.request_timeout,
        );
        if let Some(group) = &spec.group {
            let group = Group::non_empty(group.as_str());
            if group.is_some() && code.kind().is_one_shot() {
                return Err(EngineError::MalformedParams {
                    code: spec.code.clone(),
                    reason: "one-shot effects take no group".to_string(),
                });
            }
            request = request.with_group(group);
        }
        if let Some(secs) = spec.duration_secs {
            let duration = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|duration| !duration.is_zero())
                .ok_or_else(|| EngineError::MalformedParams {
                    code: spec.code.clone(),
                    reason: format!("duration must be a positive number of seconds, got {secs}"),
                })?;
            request = request.with_duration(duration);
        }
        Ok(request)
    }

    /// Stop a running request and wait for its cleanup.
    /// `false` when the request is not (or no longer) active.
    pub async fn stop(&self, id: RequestId) -> bool {
        let Some(handle) = self.active_map().get(&id).cloned() else {
            return false;
        };
        let termination = handle.cancel(CancelReason::Stopped).await;
        info!(request = %id, ?termination, "request stopped");
        true
    }

    /// Wait for a tracked request to finish.
    pub async fn wait(&self, id: RequestId) -> Option<Termination> {
        let handle = self.active_map().get(&id).cloned()?;
        Some(handle.wait().await)
    }

    pub fn active(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.active_map().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Wait until nothing is active.
    pub async fn wait_all(&self) {
        let handles: Vec<EffectHandle> = self.active_map().values().cloned().collect();
        for handle in handles {
            handle.wait().await;
        }
    }

    /// Stop everything still active; every owed completion hook has run on return.
    pub async fn shutdown(&self) -> usize {
        let handles: Vec<EffectHandle> = self.active_map().values().cloned().collect();
        for handle in &handles {
            handle.request_cancel(CancelReason::Stopped);
        }
        for handle in &handles {
            handle.wait().await;
        }
        info!(stopped = handles.len(), "controller shut down");
        handles.len()
    }
}

fn lock(active: &ActiveMap) -> MutexGuard<'_, HashMap<RequestId, EffectHandle>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tokio::time::Instant;

    use super::*;
    use crate::app::EngineConfig;
    use crate::engine::Engine;
    use crate::impls::{InMemoryDevice, RecordingEventSink, RecordingNotifier};
    use crate::pack::memory_map as mm;
    use crate::ports::{FixedClock, Width};

    struct Fixture {
        device: Arc<InMemoryDevice>,
        notifier: Arc<RecordingNotifier>,
        events: Arc<RecordingEventSink>,
        controller: Controller,
    }

    fn fixture() -> Fixture {
        let device = Arc::new(InMemoryDevice::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let events = Arc::new(RecordingEventSink::new());
        let ctx = EffectContext::new(
            Engine::new(events.clone()),
            device.clone(),
            notifier.clone(),
        );
        let config = EngineConfig::default();
        let controller = Controller::new(ctx, config.timings().unwrap(), config.request_timeout());
        Fixture {
            device,
            notifier,
            events,
            controller,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_code_is_rejected_before_anything_runs() {
        let f = fixture();
        let err = f
            .controller
            .submit(RequestSpec::new("teleport", "viewer"))
            .unwrap_err();

        assert!(matches!(err, EngineError::UnknownEffect(ref code) if code == "teleport"));
        assert!(f.controller.active().is_empty());
        assert!(matches!(
            f.events.events().as_slice(),
            [EffectEvent::Rejected { code, .. }] if code == "teleport"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn bad_parameter_is_rejected() {
        let f = fixture();
        let err = f
            .controller
            .submit(RequestSpec::new("hpplus_40", "viewer"))
            .unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(f.device.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_timing_is_rejected() {
        let f = fixture();
        let controller = Controller::new(
            f.controller.context().clone(),
            Timings::default(),
            Duration::from_secs(60),
        );
        let err = controller
            .submit(RequestSpec::new("hidehud", "viewer"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoTiming(ref kind) if kind == "hidehud"));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_requests_leave_the_active_set() {
        let f = fixture();
        f.device.poke(mm::CURRENT_HP, Width::W16, 10);
        f.device.poke(mm::MAX_HP, Width::W16, 100);

        let id = f.controller.submit(RequestSpec::new("hpplus_1", "viewer")).unwrap();
        assert_eq!(f.controller.wait(id).await, Some(Termination::Applied));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(f.controller.active().is_empty());
        assert_eq!(f.controller.wait(id).await, None);
        assert!(matches!(
            f.events.events().first(),
            Some(EffectEvent::Accepted { request, code }) if *request == id && code == "hpplus_1"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_runs_the_hook_before_returning() {
        let f = fixture();
        f.device.poke(mm::CAMERA_FOV, Width::W32, mm::FOV_ORIGINAL);

        let id = f.controller.submit(RequestSpec::new("wideview", "viewer")).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(f.device.is_frozen(mm::CAMERA_FOV));

        assert!(f.controller.stop(id).await);
        assert!(!f.device.is_frozen(mm::CAMERA_FOV));
        assert_eq!(f.device.peek(mm::CAMERA_FOV, Width::W32), mm::FOV_ORIGINAL);
        assert!(!f.controller.stop(RequestId::generate()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_and_group_can_be_overridden() {
        let f = fixture();
        f.device.poke(mm::HUD_TIMER, Width::W16, 0);
        f.device.poke(mm::CAMERA_FOV, Width::W32, mm::FOV_ORIGINAL);

        let start = Instant::now();
        let hud = f
            .controller
            .submit(RequestSpec::new("hidehud", "viewer").duration_secs(5.0))
            .unwrap();
        assert_eq!(f.controller.wait(hud).await, Some(Termination::Expired));
        assert_eq!(start.elapsed(), Duration::from_secs(5));

        // Without a group the two camera effects do not supersede each other.
        let wide = f
            .controller
            .submit(RequestSpec::new("wideview", "a").group(""))
            .unwrap();
        let flip = f
            .controller
            .submit(RequestSpec::new("flipcamera", "b").group(""))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.controller.active().len(), 2);
        assert!(f.controller.active().contains(&wide));
        assert!(f.controller.active().contains(&flip));

        assert_eq!(f.controller.shutdown().await, 2);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(f.controller.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn older_request_overtaken_in_its_group_tells_the_requester() {
        let f = fixture();
        f.device.poke(mm::CAMERA_FOV, Width::W32, mm::FOV_WIDE);

        // Already wide: waits until the camera changes.
        let older = f.controller.submit(RequestSpec::new("wideview", "alice")).unwrap();
        let newer = f
            .controller
            .submit(RequestSpec::new("narrowview", "bob").duration_secs(5.0))
            .unwrap();

        assert_eq!(f.controller.wait(older).await, Some(Termination::Stale));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(f.device.frozen_value(mm::CAMERA_FOV), Some(mm::FOV_NARROW));
        assert_eq!(f.controller.active(), vec![newer]);
        assert_eq!(
            f.notifier.messages().last().map(String::as_str),
            Some("alice's wideview was skipped, a newer request took its place")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn group_on_a_one_shot_is_rejected() {
        let f = fixture();
        let err = f
            .controller
            .submit(RequestSpec::new("hpplus_1", "viewer").group("vitals"))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedParams { ref code, .. } if code == "hpplus_1"));
        assert!(f.controller.active().is_empty());

        // "no group" stays accepted.
        f.device.poke(mm::CURRENT_HP, Width::W16, 10);
        f.device.poke(mm::MAX_HP, Width::W16, 100);
        let id = f
            .controller
            .submit(RequestSpec::new("hpplus_1", "viewer").group(""))
            .unwrap();
        assert_eq!(f.controller.wait(id).await, Some(Termination::Applied));
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_duration_is_rejected() {
        let f = fixture();
        let err = f
            .controller
            .submit(RequestSpec::new("hidehud", "viewer").duration_secs(-1.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedParams { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_at_comes_from_the_clock() {
        let f = fixture();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let controller = Controller::new(
            f.controller.context().clone(),
            EngineConfig::default().timings().unwrap(),
            Duration::from_secs(60),
        )
        .with_clock(Arc::new(FixedClock::new(at)));

        let request = controller
            .prepare(&RequestSpec::new("cloakcolor_red", "viewer"))
            .unwrap();
        assert_eq!(request.submitted_at, at);
        assert_eq!(request.requester, "viewer");
        assert!(f.notifier.messages().is_empty());
    }
}
