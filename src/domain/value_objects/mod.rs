pub mod action_id;
pub mod action_kind;
pub mod connectivity_status;
pub mod entity_id;
pub mod entity_kind;
pub mod payload;

pub use action_id::ActionId;
pub use action_kind::ActionKind;
pub use connectivity_status::ConnectivityStatus;
pub use entity_id::EntityId;
pub use entity_kind::EntityKind;
pub use payload::ActionPayload;
