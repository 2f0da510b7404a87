//! Inbound request and the immutable value handed to a handler.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::Timing;
use crate::domain::{Group, RequestId};
use crate::engine::{RepeatPolicy, RetryPolicy};
use crate::pack::EffectCode;

/// What a requester sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// `base[_param]`, e.g. `hpplus_5`.
    pub code: String,

    /// Display name used in viewer messages.
    pub requester: String,

    /// Replaces the code's own group. An empty string means "no group".
    #[serde(default)]
    pub group: Option<String>,

    /// Replaces the configured duration.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

impl RequestSpec {
    pub fn new(code: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            requester: requester.into(),
            group: None,
            duration_secs: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn duration_secs(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

/// An accepted request. Never mutated after the controller builds it.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    pub id: RequestId,
    pub code: EffectCode,
    pub requester: String,
    pub submitted_at: DateTime<Utc>,

    /// Hold/tick duration.
    pub duration: Duration,

    /// Effective group: the inbound override, else the code's own.
    pub group: Option<Group>,

    /// Deadline for the effect to take effect, from acceptance.
    pub expires_in: Duration,

    pub retry_delay: Duration,
    pub repeat_delay: Duration,
}

impl EffectRequest {
    pub fn new(
        id: RequestId,
        code: EffectCode,
        requester: impl Into<String>,
        submitted_at: DateTime<Utc>,
        timing: Timing,
        expires_in: Duration,
    ) -> Self {
        Self {
            id,
            group: code.default_group(),
            code,
            requester: requester.into(),
            submitted_at,
            duration: timing.duration,
            expires_in,
            retry_delay: timing.retry_delay,
            repeat_delay: timing.repeat_delay,
        }
    }

    pub fn with_group(mut self, group: Option<Group>) -> Self {
        self.group = group;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay, Some(self.expires_in))
    }

    /// `reset_on_tick_failure`: a failed tick extends the duration.
    pub fn repeat_policy(&self, reset_on_tick_failure: bool) -> RepeatPolicy {
        RepeatPolicy::new(self.retry_delay, self.repeat_delay)
            .reset_on_tick_failure(reset_on_tick_failure)
    }

    /// Duration as shown to viewers.
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs_f64().round() as u64
    }
}
