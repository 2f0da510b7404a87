//! Domain model (IDs, groups, lifecycle state, events, errors).

pub mod errors;
pub mod events;
pub mod group;
pub mod ids;
pub mod state;

pub use self::errors::EngineError;
pub use self::events::EffectEvent;
pub use self::group::Group;
pub use self::ids::{InstanceId, RequestId};
pub use self::state::{CancelReason, EffectStatus, Phase, Termination};
