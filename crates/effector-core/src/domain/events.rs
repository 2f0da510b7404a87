//! Events - ドメインイベント
//!
//! Controller と Engine が発行し、EventSink が受け取ります。

use super::{InstanceId, RequestId, Termination};
use super::Group;

/// DomainEvent はリクエストのライフサイクルで発生したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectEvent {
    /// Request passed validation and a primitive was spawned.
    Accepted { request: RequestId, code: String },

    /// Request was rejected before any primitive was built.
    Rejected { code: String, reason: String },

    /// Instance took effect (action or setup succeeded).
    Activated {
        instance: InstanceId,
        request: RequestId,
        group: Option<Group>,
    },

    /// Instance reached `Completed`.
    Terminated {
        instance: InstanceId,
        request: RequestId,
        termination: Termination,
        hook_ran: bool,
    },
}

impl EffectEvent {
    pub fn request(&self) -> Option<RequestId> {
        match self {
            EffectEvent::Accepted { request, .. }
            | EffectEvent::Activated { request, .. }
            | EffectEvent::Terminated { request, .. } => Some(*request),
            EffectEvent::Rejected { .. } => None,
        }
    }
}
