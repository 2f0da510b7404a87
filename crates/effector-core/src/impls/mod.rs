//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryDevice**: 疎なメモリ + freeze テーブル + 故障注入
//! - **TracingNotifier** / **RecordingNotifier**
//! - **TracingEventSink** / **RecordingEventSink**
//!
//! 実機の Device（エミュレータ接続）はこのクレートの外に置きます。

pub mod event_sink;
pub mod memory_device;
pub mod notifier;

pub use self::event_sink::{RecordingEventSink, TracingEventSink};
pub use self::memory_device::{FaultMode, InMemoryDevice};
pub use self::notifier::{RecordingNotifier, TracingNotifier};
