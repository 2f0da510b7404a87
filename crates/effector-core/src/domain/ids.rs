//! Domain identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type で型付けします。
//!
//! - `RequestId`: 外部から届いた 1 件のリクエスト（stop の単位）
//! - `InstanceId`: primitive の実行インスタンス（group の occupant になる単位）
//!
//! 同じ ULID から作っても `RequestId` と `InstanceId` は混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"req-", "fx-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Fresh id from the system clock and thread rng.
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Request {}

impl IdMarker for Request {
    fn prefix() -> &'static str {
        "req-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instance {}

impl IdMarker for Instance {
    fn prefix() -> &'static str {
        "fx-"
    }
}

/// Identifier of an accepted effect request (stop/status unit).
pub type RequestId = Id<Request>;

/// Identifier of one running primitive instance.
pub type InstanceId = Id<Instance>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let request = RequestId::from_ulid(ulid1);
        let instance = InstanceId::from_ulid(ulid2);

        assert_eq!(request.as_ulid(), ulid1);
        assert_eq!(instance.as_ulid(), ulid2);

        assert!(request.to_string().starts_with("req-"));
        assert!(instance.to_string().starts_with("fx-"));

        // let _: RequestId = instance; // <- does not compile
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = InstanceId::generate();
        let b = InstanceId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_can_be_serialized() {
        let id = RequestId::generate();
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: RequestId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<RequestId>(), size_of::<Ulid>());
        assert_eq!(size_of::<InstanceId>(), size_of::<Ulid>());
    }
}
