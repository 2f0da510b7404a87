//! One-shot-with-retry: apply once, eventually.
//!
//! # フロー
//! 1. precondition を評価
//! 2. true なら action を実行
//! 3. action が成功したら on_success を呼んで終了（Applied）
//! 4. どちらかが false なら retry delay だけ待って 1 に戻る
//! 5. 絶対期限を過ぎたら何もせず終了（TimedOut、通知なし）

use tokio::time::Instant;
use tracing::debug;

use super::hook::{Action, OnSuccess, Precondition};
use super::instance::InstanceCore;
use super::RetryPolicy;
use crate::domain::{Phase, Termination};

/// Parameters of a one-shot effect.
pub struct OneShot {
    pub(crate) precondition: Precondition,
    pub(crate) action: Action,
    pub(crate) on_success: Option<OnSuccess>,
    pub(crate) retry: RetryPolicy,
}

impl OneShot {
    pub fn new(
        precondition: impl Fn() -> bool + Send + 'static,
        action: impl FnMut() -> bool + Send + 'static,
    ) -> Self {
        Self {
            precondition: Box::new(precondition),
            action: Box::new(action),
            on_success: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn on_success(mut self, notify: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(notify));
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

pub(crate) async fn run(mut core: InstanceCore, spec: OneShot, spawned_at: Instant) -> Termination {
    let OneShot {
        precondition,
        mut action,
        on_success,
        retry,
    } = spec;
    let deadline = retry.timeout.map(|timeout| spawned_at + timeout);
    core.set_phase(Phase::Waiting);

    let mut attempts: u32 = 0;
    loop {
        if let Some(reason) = core.cancel_requested() {
            return core.finish(reason.into(), None);
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            debug!(instance = %core.id(), attempts, "one-shot deadline passed");
            return core.finish(Termination::TimedOut, None);
        }

        attempts += 1;
        if precondition() && action() {
            if let Some(notify) = on_success {
                notify();
            }
            return core.finish(Termination::Applied, None);
        }

        let mut wake = Instant::now() + retry.delay;
        if let Some(deadline) = deadline {
            wake = wake.min(deadline);
        }
        if let Err(reason) = core.pause_until(wake).await {
            return core.finish(reason.into(), None);
        }
    }
}
