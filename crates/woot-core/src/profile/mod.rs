//! Profile domain module.
//!
//! This module contains the signed-in user's profile and the header state
//! derived from it.
//!
//! # Module Structure
//!
//! - `model`: Profile domain model, initials and header state
//! - `source`: Trait for collaborators that fetch a profile
//!
//! # Usage
//!
//! ```ignore
//! use woot_core::profile::{Profile, HeaderState, ProfileSource};
//! ```

mod model;
mod source;

// Re-export public API
pub use model::{
    Avatar, FALLBACK_INITIALS, HeaderState, HeaderStatus, PLACEHOLDER_NAME, Profile, initials,
};
pub use source::ProfileSource;
