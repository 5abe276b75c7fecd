pub mod constants;
pub mod error;
pub mod events;
pub mod types;

pub use error::ElaraError;
pub use events::{Event, EventBus, EventHandler, InMemoryBus};
pub use types::{Classification, CryptoProfile, EntityType, IdentityHash, NodeType};
