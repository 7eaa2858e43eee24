pub mod errors;
pub mod events;
pub mod id;
pub mod messages;

pub use errors::{AuthError, ConfigError, OnairError};
pub use events::{Event, EventBus};
pub use id::{new_id, ContextId};
pub use messages::{ContextRole, ExtensionRequest, ExtensionResponse};

pub type Result<T> = std::result::Result<T, OnairError>;
