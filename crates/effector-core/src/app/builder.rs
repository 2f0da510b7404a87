//! AppBuilder - Controller の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - Device が渡されていること
//! - `expect_kinds()` で指定した効果すべてに timing があること
//!
//! 不足はリクエストが届いてからではなく `build()` の時点でエラーにします。

use std::sync::Arc;

use super::config::{ConfigError, EngineConfig, Timings};
use super::controller::Controller;
use crate::engine::Engine;
use crate::impls::{TracingEventSink, TracingNotifier};
use crate::pack::{EffectContext, EffectKind};
use crate::ports::{Clock, Device, EventSink, IdGenerator, Notifier};

/// AppBuilder は Controller を構築
///
/// # 使用例
/// ```ignore
/// let controller = AppBuilder::new()
///     .device(device)
///     .config(EngineConfig::load("effector.json")?)
///     .expect_kinds(&EffectKind::ALL)
///     .build()?;
/// ```
pub struct AppBuilder {
    device: Option<Arc<dyn Device>>,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventSink>,
    ids: Option<Arc<dyn IdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
    config: EngineConfig,
    timings: Option<Timings>,
    expected_kinds: Option<Vec<EffectKind>>,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no device configured")]
    MissingDevice,

    #[error("Missing timings: {0:?}. These effects were expected but have no timing.")]
    MissingTimings(Vec<EffectKind>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            device: None,
            notifier: Arc::new(TracingNotifier),
            events: Arc::new(TracingEventSink),
            ids: None,
            clock: None,
            config: EngineConfig::default(),
            timings: None,
            expected_kinds: None,
        }
    }

    pub fn device(mut self, device: Arc<dyn Device>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults merged with the configured overrides.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use exactly these timings instead of the ones derived from the config.
    pub fn timings(mut self, timings: Timings) -> Self {
        self.timings = Some(timings);
        self
    }

    /// Effects that must have a timing for `build()` to succeed.
    pub fn expect_kinds(mut self, kinds: &[EffectKind]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    pub fn build(self) -> Result<Controller, BuildError> {
        let device = self.device.ok_or(BuildError::MissingDevice)?;
        self.config.validate()?;
        let timings = match self.timings {
            Some(timings) => timings,
            None => self.config.timings()?,
        };

        if let Some(expected) = &self.expected_kinds {
            let missing: Vec<EffectKind> = expected
                .iter()
                .filter(|kind| timings.get(**kind).is_none())
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTimings(missing));
            }
        }

        let engine = match self.ids {
            Some(ids) => Engine::with_ids(self.events, ids),
            None => Engine::new(self.events),
        };
        let ctx = EffectContext::new(engine, device, self.notifier);
        let controller = Controller::new(ctx, timings, self.config.request_timeout());
        Ok(match self.clock {
            Some(clock) => controller.with_clock(clock),
            None => controller,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
