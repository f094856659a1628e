use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use woot_core::config::{InjectionSettings, SessionConfig};
use woot_core::error::{Result, WootError};
use woot_core::payload::{BridgePayload, BridgePayloadBuilder, ConversationId};
use woot_core::profile::{HeaderState, Profile, ProfileSource};
use woot_core::session::{CloseOrigin, EmbeddedRuntime, InboundMessage, SessionEvent, SessionState};

use super::delivery::{InjectionTrigger, deliver};
use crate::profile_resolver::ProfileResolver;

#[derive(Default)]
struct ControllerState {
    phase: SessionState,
    config: Option<SessionConfig>,
    conversation: Option<ConversationId>,
}

/// State shared with the profile listener and deferred delivery tasks.
struct Shared {
    session_id: Uuid,
    state: Mutex<ControllerState>,
    header: watch::Sender<HeaderState>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
}

/// Orchestrates one chat session.
///
/// `ChatSessionController` is responsible for:
/// - Holding the session configuration and the open conversation
/// - Triggering profile resolution and turning the result into header state
/// - Delivering the bridge payload at every load/reload boundary
/// - Routing close requests from either side to the host exactly once
///
/// Notifications for the host arrive on the receiver returned by
/// [`ChatSessionController::new`]; the host drains it on its UI thread.
pub struct ChatSessionController {
    shared: Arc<Shared>,
    resolver: ProfileResolver,
    runtime: Arc<dyn EmbeddedRuntime>,
    settings: InjectionSettings,
    handle: Handle,
}

impl ChatSessionController {
    /// Creates a controller in the `Uninitialized` state.
    ///
    /// # Arguments
    ///
    /// * `source` - Where the profile is fetched from
    /// * `runtime` - The embedded web runtime payloads are delivered to
    /// * `settings` - Deferred re-injection schedule
    /// * `handle` - Runtime the profile fetch and timers are spawned on
    pub fn new(
        source: Arc<dyn ProfileSource>,
        runtime: Arc<dyn EmbeddedRuntime>,
        settings: InjectionSettings,
        handle: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (header, _) = watch::channel(HeaderState::loading());
        let shared = Arc::new(Shared {
            session_id: Uuid::new_v4(),
            state: Mutex::new(ControllerState::default()),
            header,
            events,
            cancel: CancellationToken::new(),
        });

        let controller = Self {
            shared,
            resolver: ProfileResolver::new(source, handle.clone()),
            runtime,
            settings,
            handle,
        };
        (controller, receiver)
    }

    /// Stores `config` and starts resolving the profile.
    ///
    /// Calling it again replaces the config; an outstanding fetch for the old
    /// config is not cancelled but its result is discarded.
    ///
    /// # Errors
    ///
    /// Returns `WootError::SessionClosed` after the session was closed.
    pub fn setup(&self, config: SessionConfig) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if state.phase.is_closed() {
                return Err(WootError::SessionClosed);
            }
            state.config = Some(config.clone());
            state.phase = SessionState::Configured;
            tracing::info!(
                session_id = %self.shared.session_id,
                config = ?config,
                "[Session] Configured"
            );

            state.phase = SessionState::ProfileLoading;
            self.shared.publish_header(HeaderState::loading());
        }

        self.resolver.fetch(&config);
        let shared = Arc::downgrade(&self.shared);
        self.resolver
            .subscribe(move |profile| Shared::on_profile(&shared, profile));
        Ok(())
    }

    /// Opens a conversation and delivers the payload for the initial load.
    ///
    /// # Errors
    ///
    /// - `WootError::NotConfigured` before [`ChatSessionController::setup`]
    /// - `WootError::InvalidConversation` when `conversation_id <= 0`; nothing
    ///   is delivered in that case
    /// - `WootError::SessionClosed` after the session was closed
    pub fn open_chat(&self, conversation_id: i64) -> Result<BridgePayload> {
        let payload = {
            let mut state = self.shared.lock();
            match state.phase {
                SessionState::Uninitialized => {
                    return Err(WootError::not_configured("open_chat requires setup"));
                }
                SessionState::Closed => return Err(WootError::SessionClosed),
                _ => {}
            }

            let conversation = ConversationId::new(conversation_id)?;
            let config = state
                .config
                .as_ref()
                .ok_or_else(|| WootError::not_configured("open_chat requires setup"))?;
            let payload = BridgePayloadBuilder::build(config, conversation);
            state.conversation = Some(conversation);
            payload
        };

        tracing::info!(
            session_id = %self.shared.session_id,
            conversation_id,
            "[Session] Chat opened"
        );
        deliver(
            self.runtime.as_ref(),
            self.shared.session_id,
            &payload,
            InjectionTrigger::InitialLoad,
        );
        Ok(payload)
    }

    /// The page finished loading: deliver again and schedule deferred
    /// deliveries.
    ///
    /// # Errors
    ///
    /// Returns `WootError::NotConfigured` when no chat has been opened.
    pub fn on_embedded_runtime_ready(&self) -> Result<()> {
        self.redeliver(InjectionTrigger::RuntimeReady)
    }

    /// The page was reloaded and lost its globals: deliver again and schedule
    /// deferred deliveries.
    ///
    /// # Errors
    ///
    /// Returns `WootError::NotConfigured` when no chat has been opened.
    pub fn on_page_reloaded(&self) -> Result<()> {
        self.redeliver(InjectionTrigger::PageReloaded)
    }

    /// Handles a raw message posted by the embedded runtime.
    pub fn on_runtime_message(&self, raw: &str) {
        match InboundMessage::parse(raw) {
            InboundMessage::Close => {
                self.on_close_requested(CloseOrigin::Runtime);
            }
            InboundMessage::Unknown(message) => {
                tracing::debug!(
                    session_id = %self.shared.session_id,
                    "[Session] Ignoring runtime message: {}",
                    message
                );
            }
        }
    }

    /// Closes the session.
    ///
    /// Only the first call has an effect: it cancels pending deliveries,
    /// drops pending profile listeners, tells the page via `chatwootClose`
    /// when the close came from native UI, and emits a single
    /// `SessionEvent::Closed`. Returns whether this call closed the session.
    pub fn on_close_requested(&self, origin: CloseOrigin) -> bool {
        {
            let mut state = self.shared.lock();
            if state.phase.is_closed() {
                tracing::debug!(
                    session_id = %self.shared.session_id,
                    "[Session] Close requested again, ignoring"
                );
                return false;
            }
            state.phase = SessionState::Closed;
        }

        self.shared.cancel.cancel();
        self.resolver.clear_listeners();

        if origin == CloseOrigin::Native
            && let Err(e) = self.runtime.dispatch_close()
        {
            tracing::warn!(
                session_id = %self.shared.session_id,
                "[Session] Failed to dispatch close event: {}",
                e
            );
        }

        let _ = self.shared.events.send(SessionEvent::Closed { origin });
        tracing::info!(
            session_id = %self.shared.session_id,
            origin = ?origin,
            "[Session] Closed"
        );
        true
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().phase
    }

    pub fn config(&self) -> Option<SessionConfig> {
        self.shared.lock().config.clone()
    }

    pub fn conversation(&self) -> Option<ConversationId> {
        self.shared.lock().conversation
    }

    /// Current header state.
    pub fn header(&self) -> HeaderState {
        self.shared.header.borrow().clone()
    }

    /// Observes header changes, starting with the current state.
    pub fn header_updates(&self) -> watch::Receiver<HeaderState> {
        self.shared.header.subscribe()
    }

    /// The resolver owned by this session.
    pub fn resolver(&self) -> &ProfileResolver {
        &self.resolver
    }

    fn redeliver(&self, trigger: InjectionTrigger) -> Result<()> {
        let Some(payload) = self.shared.current_payload()? else {
            tracing::debug!(
                session_id = %self.shared.session_id,
                trigger = %trigger,
                "[Session] Closed, skipping delivery"
            );
            return Ok(());
        };

        deliver(
            self.runtime.as_ref(),
            self.shared.session_id,
            &payload,
            trigger,
        );
        self.schedule_deferred();
        Ok(())
    }

    fn schedule_deferred(&self) {
        for delay in self.settings.deferred_reinjection.iter().copied() {
            let shared = Arc::clone(&self.shared);
            let runtime = Arc::clone(&self.runtime);
            self.handle.spawn(async move {
                tokio::select! {
                    _ = shared.cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        // Re-derived at fire time; a closed session yields nothing.
                        if let Ok(Some(payload)) = shared.current_payload() {
                            deliver(
                                runtime.as_ref(),
                                shared.session_id,
                                &payload,
                                InjectionTrigger::Deferred,
                            );
                        }
                    }
                }
            });
        }
    }
}

impl Drop for ChatSessionController {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Payload for the open conversation, `None` once closed.
    fn current_payload(&self) -> Result<Option<BridgePayload>> {
        let state = self.lock();
        if state.phase.is_closed() {
            return Ok(None);
        }
        match (&state.config, state.conversation) {
            (Some(config), Some(conversation)) => {
                Ok(Some(BridgePayloadBuilder::build(config, conversation)))
            }
            (None, _) => Err(WootError::not_configured("delivery requires setup")),
            (Some(_), None) => Err(WootError::not_configured("delivery requires open_chat")),
        }
    }

    /// Stores the header and notifies the host when it changed.
    /// Callers hold the state lock so header updates never follow `Closed`.
    fn publish_header(&self, header: HeaderState) {
        let changed = self.header.send_if_modified(|current| {
            if *current == header {
                false
            } else {
                *current = header.clone();
                true
            }
        });
        if changed {
            let _ = self.events.send(SessionEvent::HeaderChanged { header });
        }
    }

    fn on_profile(shared: &Weak<Shared>, profile: Profile) {
        let Some(shared) = shared.upgrade() else {
            return;
        };

        let mut state = shared.lock();
        if state.phase.is_closed() {
            tracing::debug!(
                session_id = %shared.session_id,
                "[Session] Profile arrived after close, ignoring"
            );
            return;
        }
        if state.phase == SessionState::ProfileLoading {
            state.phase = SessionState::ProfileResolved;
        }
        shared.publish_header(HeaderState::from_profile(&profile));
        tracing::info!(
            session_id = %shared.session_id,
            fallback = profile.is_placeholder(),
            "[Session] Header updated"
        );
    }
}
