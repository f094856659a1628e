//! Session domain module.
//!
//! This module contains the chat session lifecycle types, the messages
//! exchanged with the host shell and the embedded runtime, and the runtime
//! collaborator trait.
//!
//! # Module Structure
//!
//! - `state`: Session lifecycle states and close origins
//! - `event`: Host notifications and inbound runtime messages
//! - `runtime`: Trait for the embedded web runtime
//!
//! # Usage
//!
//! ```ignore
//! use woot_core::session::{SessionState, SessionEvent, EmbeddedRuntime};
//! ```

mod event;
mod runtime;
mod state;

// Re-export public API
pub use event::{InboundMessage, SessionEvent};
pub use runtime::EmbeddedRuntime;
pub use state::{CloseOrigin, SessionState};
