//! Ports - 抽象化レイヤー
//!
//! Engine が消費する外部インターフェース。Engine 自身はこれらを実装しません。
//! - Device: 外部プロセスのメモリ（read/write/freeze/range_add）
//! - Notifier: 視聴者向けメッセージ
//! - EventSink: ライフサイクルイベント
//! - Clock / IdGenerator: 時刻と ID

pub mod clock;
pub mod device;
pub mod event_sink;
pub mod id_generator;
pub mod notifier;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::device::{Address, Device, Width};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::Notifier;
