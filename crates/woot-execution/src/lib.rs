//! Host-side runtime glue: the SDK's tokio runtime, tracing setup, and the
//! layer forwarding SDK log events to the host.

pub mod logging;
pub mod runtime;
pub mod tracing_layer;

pub use runtime::SdkRuntime;
pub use tracing_layer::{SdkLogEvent, SdkLogLayer};
