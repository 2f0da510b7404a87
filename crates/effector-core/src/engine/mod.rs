//! Engine - 効果の実行プリミティブ
//!
//! # プリミティブ
//! - **OneShot**: 条件が揃うまで再試行して一度だけ適用
//! - **TimedHold**: 適用して一定時間保持、終了時に必ず元に戻す
//! - **Periodic**: 一定間隔で再適用し続け、終了時に元に戻す
//!
//! # 共有するもの
//! - **GroupLockRegistry**: group ごとに同時に 1 つだけ active
//! - **EffectHandle**: 停止要求と終了待ち
//! - **CompletionHook**: engaged になったインスタンスの後始末（ちょうど 1 回）

mod handle;
mod hook;
mod instance;
mod one_shot;
mod periodic;
mod policy;
mod registry;
mod scheduler;
mod timed;

pub use self::handle::EffectHandle;
pub use self::hook::{Action, CompletionHook, OnSuccess, Precondition, TickAction, TickResult};
pub use self::one_shot::OneShot;
pub use self::periodic::Periodic;
pub use self::policy::{RepeatPolicy, RetryPolicy, TickFailure};
pub use self::registry::{Acquire, GroupLockRegistry, Occupant};
pub use self::scheduler::Engine;
pub use self::timed::TimedHold;
