//! Chat session application services.
//!
//! This module contains the session controller and the delivery of bridge
//! payloads into the embedded runtime.

mod controller;
mod delivery;

pub use controller::ChatSessionController;
pub use delivery::InjectionTrigger;
