//! Notifier port - 視聴者向けメッセージ
//!
//! handler が成功・失敗・終了時に呼びます。戻り値は送信できたかどうか。

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> bool;
}
