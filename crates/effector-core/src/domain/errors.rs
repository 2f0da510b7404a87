//! Errors - リクエスト受付時のエラー
//!
//! Device のエラーはここには来ません（retry で局所的に回復する）。
//! ここにあるのは primitive を作る前に Controller が弾くものだけです。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown effect code '{0}'")]
    UnknownEffect(String),

    #[error("malformed parameters for '{code}': {reason}")]
    MalformedParams { code: String, reason: String },

    #[error("no timing configured for effect kind '{0}'")]
    NoTiming(String),
}

impl EngineError {
    /// Rejections the requester could fix by sending a different code.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownEffect(_) | EngineError::MalformedParams { .. }
        )
    }
}
