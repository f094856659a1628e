use crate::error::Result;
use crate::payload::BridgePayload;

/// The embedded web content, as seen from the bridge.
///
/// Implementations live in the host shell and wrap a platform web view. They
/// choose between [`BridgePayload::to_script`] and
/// [`BridgePayload::to_message`] depending on what the web view supports.
/// Calls may arrive from any thread; implementations hop to the UI thread
/// themselves.
pub trait EmbeddedRuntime: Send + Sync {
    /// Delivers the configuration globals and `chatwootConfigLoaded`.
    ///
    /// Errors are reported as `WootError::InjectionFailed` and are non-fatal.
    fn inject(&self, payload: &BridgePayload) -> Result<()>;

    /// Dispatches `chatwootClose` into the page.
    fn dispatch_close(&self) -> Result<()>;
}
