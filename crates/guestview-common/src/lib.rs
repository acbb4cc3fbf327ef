pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ConfigError, DisplayError, GuestViewError};
pub use events::{EventBridge, GuestEvent, GuestEventKind, Subscription, SubscriptionId};
pub use id::{new_correlation_id, GuestId, SurfaceId};

pub type Result<T> = std::result::Result<T, GuestViewError>;
