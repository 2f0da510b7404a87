//! Pack - 効果ハンドラ層（Quest 64）
//!
//! 各効果コードを 3 つの primitive のどれかに組み立てます。Engine 自身は
//! コードの意味を知りません。
//!
//! # モジュール
//! - **code**: 閉じた `EffectCode` enum と parse
//! - **memory_map** / **tables**: アドレスと静的データ
//! - **probe**: 複数のハンドラが使う読み取りと SFX
//! - **vitals** / **spirits** / **battle** / **presentation** / **size** / **spells**: ハンドラ本体
//!
//! # 約束事
//! - Action は retry 安全に書く（目標値は最初の計算で固定する `Pinned`）
//! - group に属さないアドレスを timed/periodic から触らない

pub mod code;
pub mod memory_map;
pub mod pinned;
pub mod probe;
pub mod tables;

mod battle;
mod presentation;
mod size;
pub mod spells;
mod spirits;
mod vitals;

use std::sync::Arc;

pub use self::code::{CodeError, EffectCode, EffectKind, SpellPool};
pub use self::pinned::Pinned;
pub use self::tables::Element;

use crate::app::EffectRequest;
use crate::engine::{
    CompletionHook, EffectHandle, Engine, OneShot, Periodic, TickResult, TimedHold,
};
use crate::ports::{Device, Notifier};

/// What a handler may use: the engine, the device and the viewer channel.
#[derive(Clone)]
pub struct EffectContext {
    pub engine: Engine,
    pub device: Arc<dyn Device>,
    pub notifier: Arc<dyn Notifier>,
}

impl EffectContext {
    pub fn new(engine: Engine, device: Arc<dyn Device>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            engine,
            device,
            notifier,
        }
    }

    /// Closure-friendly sender for viewer messages.
    pub(crate) fn say(&self) -> Say {
        Say(Arc::clone(&self.notifier))
    }

    /// Spawn a one-shot with the request's retry policy.
    fn one_shot(
        &self,
        request: &EffectRequest,
        precondition: impl Fn() -> bool + Send + 'static,
        action: impl FnMut() -> bool + Send + 'static,
        on_success: impl FnOnce() + Send + 'static,
    ) -> EffectHandle {
        self.engine.spawn_one_shot(
            request.id,
            OneShot::new(precondition, action)
                .on_success(on_success)
                .retry(request.retry_policy()),
        )
    }

    /// Spawn a timed hold with the request's duration, group and retry policy.
    fn timed(
        &self,
        request: &EffectRequest,
        precondition: impl Fn() -> bool + Send + 'static,
        action: impl FnMut() -> bool + Send + 'static,
        hook: CompletionHook,
    ) -> EffectHandle {
        self.engine.spawn_timed(
            request.id,
            TimedHold::new(precondition, action, request.duration)
                .group(request.group.clone())
                .on_complete(hook)
                .retry(request.retry_policy()),
        )
    }

    /// Spawn a periodic effect with the request's duration, group and cadence.
    fn periodic<S: Send + 'static>(
        &self,
        request: &EffectRequest,
        precondition: impl Fn() -> bool + Send + 'static,
        setup: impl FnMut() -> Option<S> + Send + 'static,
        tick: impl FnMut(S) -> TickResult<S> + Send + 'static,
        reset_on_tick_failure: bool,
        hook: CompletionHook,
    ) -> EffectHandle {
        self.engine.spawn_periodic(
            request.id,
            Periodic::new(setup, tick, request.duration)
                .precondition(precondition)
                .group(request.group.clone())
                .repeat(request.repeat_policy(reset_on_tick_failure))
                .retry(request.retry_policy())
                .on_complete(hook),
        )
    }
}

/// Viewer message sender that can be moved into closures.
#[derive(Clone)]
pub(crate) struct Say(Arc<dyn Notifier>);

impl Say {
    pub(crate) fn send(&self, message: impl AsRef<str>) -> bool {
        self.0.notify(message.as_ref())
    }
}

/// Start the effect for an accepted request.
pub fn start(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    use vitals::{Stat, Vital};

    match request.code {
        EffectCode::HpPlus(n) => vitals::adjust_vital(ctx, request, Vital::Hp, n, true),
        EffectCode::HpMinus(n) => vitals::adjust_vital(ctx, request, Vital::Hp, n, false),
        EffectCode::MpPlus(n) => vitals::adjust_vital(ctx, request, Vital::Mp, n, true),
        EffectCode::MpMinus(n) => vitals::adjust_vital(ctx, request, Vital::Mp, n, false),
        EffectCode::AgiPlus(n) => vitals::adjust_stat(ctx, request, Stat::Agility, n, true),
        EffectCode::AgiMinus(n) => vitals::adjust_stat(ctx, request, Stat::Agility, n, false),
        EffectCode::DefPlus(n) => vitals::adjust_stat(ctx, request, Stat::Defense, n, true),
        EffectCode::DefMinus(n) => vitals::adjust_stat(ctx, request, Stat::Defense, n, false),
        EffectCode::GiveSpirit(element) => spirits::change_spirit(ctx, request, element, true),
        EffectCode::TakeSpirit(element) => spirits::change_spirit(ctx, request, element, false),
        EffectCode::LockElement(element) => spirits::lock_element(ctx, request, element),
        EffectCode::GiveItem(item) => battle::give_item(ctx, request, item),
        EffectCode::HealEnemy => battle::heal_enemy(ctx, request),
        EffectCode::StatusEffect(status) => battle::apply_status(ctx, request, status),
        EffectCode::MaxEncounter => battle::encounter_rate(ctx, request, true),
        EffectCode::MinEncounter => battle::encounter_rate(ctx, request, false),
        EffectCode::MoveUp => battle::move_multiplier(ctx, request, true),
        EffectCode::MoveDown => battle::move_multiplier(ctx, request, false),
        EffectCode::BigBrian => size::brian_size(ctx, request, true),
        EffectCode::SmallBrian => size::brian_size(ctx, request, false),
        EffectCode::WideView => presentation::camera(ctx, request, presentation::Camera::Wide),
        EffectCode::NarrowView => presentation::camera(ctx, request, presentation::Camera::Narrow),
        EffectCode::FlipCamera => presentation::camera(ctx, request, presentation::Camera::Flip),
        EffectCode::ChangeMusic(track) => presentation::change_music(ctx, request, track),
        EffectCode::HideHud => presentation::hide_hud(ctx, request),
        EffectCode::HideCompass => presentation::hide_compass(ctx, request),
        EffectCode::CloakColor(cloak) => presentation::cloak_color(ctx, request, cloak),
        EffectCode::ExpensiveSpells => spells::expensive_spells(ctx, request),
        EffectCode::CheapSpells => spells::cheap_spells(ctx, request),
        EffectCode::RandomSpell(pool) => spells::random_spell(ctx, request, pool),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the handler tests.

    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::app::{EngineConfig, Timing};
    use crate::domain::RequestId;
    use crate::impls::{InMemoryDevice, RecordingEventSink, RecordingNotifier};

    pub(crate) struct Rig {
        pub device: Arc<InMemoryDevice>,
        pub notifier: Arc<RecordingNotifier>,
        pub ctx: EffectContext,
    }

    impl Rig {
        pub(crate) fn new() -> Self {
            let device = Arc::new(InMemoryDevice::new());
            let notifier = Arc::new(RecordingNotifier::new());
            let engine = Engine::new(Arc::new(RecordingEventSink::new()));
            let ctx = EffectContext::new(engine, device.clone(), notifier.clone());
            Self {
                device,
                notifier,
                ctx,
            }
        }

        pub(crate) fn request(&self, code: &str) -> EffectRequest {
            let code: EffectCode = code.parse().unwrap();
            let timing: Timing = EngineConfig::default()
                .timings()
                .unwrap()
                .get(code.kind())
                .unwrap();
            EffectRequest::new(
                RequestId::generate(),
                code,
                "viewer",
                Utc::now(),
                timing,
                Duration::from_secs(60),
            )
        }

        pub(crate) fn start(&self, code: &str) -> EffectHandle {
            start(&self.ctx, &self.request(code))
        }

        pub(crate) fn messages(&self) -> Vec<String> {
            self.notifier.messages()
        }
    }
}
