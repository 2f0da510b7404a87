//! effector-core
//!
//! Timed and retried effects against a running game's memory.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, group, state, events, errors）
//! - **ports**: 抽象化レイヤー（Device, Notifier, EventSink, Clock, IdGenerator）
//! - **engine**: Group Lock Registry と 3 つの primitive（one-shot, timed hold, periodic）
//! - **pack**: 効果コードと Quest 64 のハンドラ
//! - **app**: Controller, AppBuilder, 設定
//! - **impls**: 実装（InMemoryDevice など開発・テスト用）

pub mod app;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod pack;
pub mod ports;
