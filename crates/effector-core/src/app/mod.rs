//! App - アプリケーション層
//!
//! Engine と Pack を組み合わせて、リクエストを受け付ける側を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: Controller の構築とワイヤリング（起動時検証つき）
//! - **Controller**: submit / stop / shutdown とアクティブなリクエストの追跡
//! - **EngineConfig**: 起動時に読む timing 設定
//! - **RequestSpec / EffectRequest**: 受信したリクエストと、handler に渡す不変値

pub mod builder;
pub mod config;
pub mod controller;
pub mod request;

pub use self::builder::{AppBuilder, BuildError};
pub use self::config::{ConfigError, EngineConfig, Timing, TimingConfig, Timings};
pub use self::controller::Controller;
pub use self::request::{EffectRequest, RequestSpec};
