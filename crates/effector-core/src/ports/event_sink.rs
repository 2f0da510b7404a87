//! EventSink port - イベント記録の抽象化
//!
//! Engine と Controller はライフサイクルの節目で `EffectEvent` を emit します。
//! emit は同期・非ブロッキングであること（スケジューラのループ内から呼ばれる）。

use crate::domain::EffectEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EffectEvent);
}

/// 何もしない EventSink
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: EffectEvent) {}
}
