pub mod config;
pub mod error;
pub mod payload;
pub mod profile;
pub mod session;

// Re-export common types
pub use config::{InjectionSettings, ResolverSettings, SdkSettings, SessionConfig};
pub use error::{Result, WootError};
pub use payload::{BridgePayload, BridgePayloadBuilder, ConversationId};
pub use profile::{HeaderState, Profile, ProfileSource};
pub use session::{CloseOrigin, EmbeddedRuntime, InboundMessage, SessionEvent, SessionState};
