//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock から timestamp を取る ULID 生成器

use crate::domain::{InstanceId, RequestId};
use crate::ports::Clock;
use ulid::Ulid;

pub trait IdGenerator: Send + Sync {
    fn generate_request_id(&self) -> RequestId;

    fn generate_instance_id(&self) -> InstanceId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// FixedClock を渡すと timestamp 部分が決定的になります。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_request_id(&self) -> RequestId {
        RequestId::from(self.next_ulid())
    }

    fn generate_instance_id(&self) -> InstanceId {
        InstanceId::from(self.next_ulid())
    }
}
