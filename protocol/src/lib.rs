//! Wire and value types shared between the observation navigator and the
//! programs that drive it.

pub mod events;
pub mod ids;
pub mod observation;
pub mod query;
pub mod wire;

pub use events::ObjectEvent;
pub use events::ObjectEventKind;
pub use events::ObjectRef;
pub use ids::ObjectId;
pub use ids::SessionId;
pub use observation::ContentItem;
pub use observation::Observation;
pub use observation::Timestamp;
pub use query::Direction;
pub use query::Query;
pub use query::SortKey;

/// Collection type carried by observation records and their notifications.
pub const OBSERVATIONS_OTYPE: &str = "observations";
