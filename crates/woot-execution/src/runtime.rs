//! Tokio runtime owned by the SDK on behalf of a native host.
//!
//! Native shells have no async runtime of their own. `SdkRuntime` starts one
//! and wires sessions to the REST profile client.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc;
use woot_application::ChatSessionController;
use woot_core::config::SdkSettings;
use woot_core::session::{EmbeddedRuntime, SessionEvent};
use woot_interaction::ProfileApiClient;

const THREAD_NAME: &str = "woot-bridge";
const WORKER_THREADS: usize = 2;

pub struct SdkRuntime {
    runtime: Runtime,
    settings: SdkSettings,
}

impl SdkRuntime {
    /// Starts a small multi-threaded runtime.
    pub fn start(settings: SdkSettings) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name(THREAD_NAME)
            .enable_all()
            .build()
            .context("Failed to build SDK runtime")?;

        tracing::info!("[Bootstrap] SDK runtime started ({} workers)", WORKER_THREADS);
        Ok(Self { runtime, settings })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Creates a session controller backed by the REST profile client.
    ///
    /// The host keeps the returned receiver and drains it on its UI thread.
    pub fn open_session(
        &self,
        web_view: Arc<dyn EmbeddedRuntime>,
    ) -> (ChatSessionController, mpsc::UnboundedReceiver<SessionEvent>) {
        let source = Arc::new(ProfileApiClient::new(&self.settings.resolver));
        ChatSessionController::new(
            source,
            web_view,
            self.settings.injection.clone(),
            self.handle(),
        )
    }

    /// Runs a future to completion on the SDK runtime.
    ///
    /// Must not be called from within an async context.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
