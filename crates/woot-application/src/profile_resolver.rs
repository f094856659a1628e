//! Profile resolution with replay of the last value.
//!
//! `ProfileResolver` fetches the profile through a [`ProfileSource`], caches
//! the result and hands it to listeners. A listener registered before a
//! resolution completes is called once with that result; a listener
//! registered afterwards is called immediately with the cached profile.
//! Failures never escape: they resolve to [`Profile::default`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use woot_core::config::SessionConfig;
use woot_core::profile::{Profile, ProfileSource};

type ProfileListener = Box<dyn FnOnce(Profile) + Send + 'static>;

#[derive(Default)]
struct ResolverState {
    /// Last committed profile and the config it was fetched for
    cached: Option<(SessionConfig, Profile)>,
    /// Generation and config of the newest outstanding request
    in_flight: Option<(u64, SessionConfig)>,
    /// Bumped for every issued request; completions of older ones are stale
    generation: u64,
    listeners: Vec<ProfileListener>,
}

struct ResolverInner {
    source: Arc<dyn ProfileSource>,
    state: Mutex<ResolverState>,
    updates: watch::Sender<Option<Profile>>,
}

/// Fetches and caches a single profile record.
///
/// Cloning is cheap; clones share the same cache and listener list.
#[derive(Clone)]
pub struct ProfileResolver {
    inner: Arc<ResolverInner>,
    runtime: Handle,
}

impl ProfileResolver {
    /// Creates a resolver that spawns its requests on `runtime`.
    pub fn new(source: Arc<dyn ProfileSource>, runtime: Handle) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            inner: Arc::new(ResolverInner {
                source,
                state: Mutex::new(ResolverState::default()),
                updates,
            }),
            runtime,
        }
    }

    /// Starts resolving the profile for `config` without blocking.
    ///
    /// Returns `None` when no request was issued: either one for an equal
    /// config is already outstanding, or the profile for it is cached.
    pub fn fetch(&self, config: &SessionConfig) -> Option<JoinHandle<()>> {
        self.spawn(config, false)
    }

    /// Like [`ProfileResolver::fetch`] but ignores the cache.
    pub fn refetch(&self, config: &SessionConfig) -> Option<JoinHandle<()>> {
        self.spawn(config, true)
    }

    /// Resolves the profile for `config` on the current task.
    ///
    /// Always issues a request. The returned profile is the one this request
    /// produced, even if a newer request superseded it before completion.
    pub async fn resolve(&self, config: &SessionConfig) -> Profile {
        ResolverInner::begin(&self.inner, config).run().await
    }

    /// Registers a one-shot listener.
    ///
    /// Called immediately, on the caller's thread, when a profile is cached.
    /// Otherwise called once when the next resolution completes.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: FnOnce(Profile) + Send + 'static,
    {
        let mut state = self.inner.lock();
        let cached = state.cached.as_ref().map(|(_, profile)| profile.clone());
        match cached {
            Some(profile) => {
                drop(state);
                listener(profile);
            }
            None => state.listeners.push(Box::new(listener)),
        }
    }

    /// Observes every committed profile, starting with the current one.
    pub fn watch(&self) -> watch::Receiver<Option<Profile>> {
        self.inner.updates.subscribe()
    }

    /// The last committed profile, if any.
    pub fn cached(&self) -> Option<Profile> {
        self.inner
            .lock()
            .cached
            .as_ref()
            .map(|(_, profile)| profile.clone())
    }

    /// True while a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// Drops every queued listener without calling it.
    pub fn clear_listeners(&self) {
        let dropped = std::mem::take(&mut self.inner.lock().listeners);
        if !dropped.is_empty() {
            tracing::debug!("[ProfileResolver] Cleared {} pending listener(s)", dropped.len());
        }
    }

    fn spawn(&self, config: &SessionConfig, force: bool) -> Option<JoinHandle<()>> {
        {
            let state = self.inner.lock();
            if let Some((_, pending)) = &state.in_flight
                && pending == config
            {
                tracing::debug!("[ProfileResolver] Request already in flight, not issuing another");
                return None;
            }
            if !force
                && let Some((cached_for, _)) = &state.cached
                && cached_for == config
            {
                tracing::debug!("[ProfileResolver] Profile already resolved for this config");
                return None;
            }
        }

        let request = ResolverInner::begin(&self.inner, config);
        Some(self.runtime.spawn(async move {
            request.run().await;
        }))
    }
}

impl ResolverInner {
    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new request.
    ///
    /// A cache entry for a different config is dropped so that late
    /// subscribers wait for the new profile instead of replaying a stale one.
    fn begin(this: &Arc<Self>, config: &SessionConfig) -> Request {
        let mut state = this.lock();
        if state
            .cached
            .as_ref()
            .is_some_and(|(cached_for, _)| cached_for != config)
        {
            state.cached = None;
            this.updates.send_replace(None);
        }
        state.generation += 1;
        state.in_flight = Some((state.generation, config.clone()));
        Request {
            inner: Arc::clone(this),
            generation: state.generation,
            config: config.clone(),
            settled: false,
        }
    }

    fn complete(&self, generation: u64, config: SessionConfig, profile: Profile) {
        let listeners = {
            let mut state = self.lock();
            if state.generation != generation {
                tracing::debug!(
                    "[ProfileResolver] Discarding result of superseded request (generation {} < {})",
                    generation,
                    state.generation
                );
                return;
            }
            state.in_flight = None;
            state.cached = Some((config, profile.clone()));
            self.updates.send_replace(Some(profile.clone()));
            std::mem::take(&mut state.listeners)
        };

        for listener in listeners {
            listener(profile.clone());
        }
    }
}

/// One issued request.
///
/// Dropped without settling (task aborted, `resolve` future dropped), it
/// releases its in-flight slot so the next fetch for the config is issued.
struct Request {
    inner: Arc<ResolverInner>,
    generation: u64,
    config: SessionConfig,
    settled: bool,
}

impl Request {
    async fn run(mut self) -> Profile {
        let config = &self.config;
        let profile = match self.inner.source.fetch_profile(config).await {
            Ok(profile) => {
                tracing::debug!(
                    account_id = config.account_id(),
                    has_avatar = profile.avatar_url.is_some(),
                    "[ProfileResolver] Profile resolved"
                );
                profile
            }
            Err(e) => {
                tracing::warn!(
                    account_id = config.account_id(),
                    "[ProfileResolver] {}; using placeholder profile",
                    e
                );
                Profile::default()
            }
        };

        self.inner
            .complete(self.generation, self.config.clone(), profile.clone());
        self.settled = true;
        profile
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.inner.lock();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|(generation, _)| *generation == self.generation)
        {
            state.in_flight = None;
            tracing::debug!(
                "[ProfileResolver] Request cancelled before completion (generation {})",
                self.generation
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use woot_core::error::{Result, WootError};

    /// Answers with a profile named after the access token, after an
    /// optional per-token delay.
    struct MockSource {
        calls: AtomicUsize,
        fail: bool,
        slow_token: Option<(&'static str, Duration)>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                slow_token: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ProfileSource for MockSource {
        async fn fetch_profile(&self, config: &SessionConfig) -> Result<Profile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((token, delay)) = self.slow_token
                && token == config.access_token()
            {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(WootError::profile_fetch("connection reset"));
            }
            Ok(Profile::new(config.access_token(), None))
        }
    }

    fn config(token: &str) -> SessionConfig {
        SessionConfig::new(1, "https://example.com", token, "", "wss://example.com/cable").unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<Profile>>>, impl FnOnce(Profile) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |profile| sink.lock().unwrap().push(profile))
    }

    #[tokio::test]
    async fn test_listeners_before_resolution_receive_result_once() {
        let source = Arc::new(MockSource::new());
        let resolver = ProfileResolver::new(source.clone(), Handle::current());
        let (first, listener_a) = recorder();
        let (second, listener_b) = recorder();
        resolver.subscribe(listener_a);
        resolver.subscribe(listener_b);

        resolver.fetch(&config("alice")).unwrap().await.unwrap();

        assert_eq!(*first.lock().unwrap(), vec![Profile::new("alice", None)]);
        assert_eq!(*second.lock().unwrap(), vec![Profile::new("alice", None)]);

        // A later resolution must not call them again.
        resolver.refetch(&config("alice")).unwrap().await.unwrap();
        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_cached_profile_immediately() {
        let source = Arc::new(MockSource::new());
        let resolver = ProfileResolver::new(source.clone(), Handle::current());
        resolver.resolve(&config("alice")).await;

        let (seen, listener) = recorder();
        resolver.subscribe(listener);

        assert_eq!(*seen.lock().unwrap(), vec![Profile::new("alice", None)]);
        assert_eq!(source.calls(), 1);
        assert!(resolver.fetch(&config("alice")).is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_resolves_to_placeholder() {
        let source = Arc::new(MockSource {
            fail: true,
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source, Handle::current());

        let profile = resolver.resolve(&config("alice")).await;

        assert_eq!(profile, Profile::default());
        assert_eq!(resolver.cached(), Some(Profile::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outstanding_request_is_not_duplicated() {
        let source = Arc::new(MockSource {
            slow_token: Some(("alice", Duration::from_millis(100))),
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source.clone(), Handle::current());

        let handle = resolver.fetch(&config("alice")).unwrap();
        assert!(resolver.is_pending());
        assert!(resolver.fetch(&config("alice")).is_none());
        handle.await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(!resolver.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_result_is_discarded() {
        let source = Arc::new(MockSource {
            slow_token: Some(("alice", Duration::from_millis(100))),
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source.clone(), Handle::current());
        let (seen, listener) = recorder();
        resolver.subscribe(listener);

        let slow = resolver.fetch(&config("alice")).unwrap();
        let fast = resolver.fetch(&config("bob")).unwrap();
        fast.await.unwrap();
        slow.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Profile::new("bob", None)]);
        assert_eq!(resolver.cached(), Some(Profile::new("bob", None)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_new_config_invalidates_cache() {
        let source = Arc::new(MockSource::new());
        let resolver = ProfileResolver::new(source, Handle::current());
        resolver.resolve(&config("alice")).await;

        let handle = resolver.fetch(&config("bob")).unwrap();
        assert_eq!(resolver.cached(), None);
        handle.await.unwrap();

        assert_eq!(resolver.cached(), Some(Profile::new("bob", None)));
    }

    #[tokio::test]
    async fn test_watch_replays_latest() {
        let resolver = ProfileResolver::new(Arc::new(MockSource::new()), Handle::current());
        let mut updates = resolver.watch();
        assert_eq!(*updates.borrow(), None);

        resolver.fetch(&config("alice")).unwrap();
        updates.changed().await.unwrap();

        assert_eq!(*updates.borrow(), Some(Profile::new("alice", None)));
        assert_eq!(*resolver.watch().borrow(), Some(Profile::new("alice", None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_fetch_releases_in_flight_slot() {
        let source = Arc::new(MockSource {
            slow_token: Some(("alice", Duration::from_millis(100))),
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source.clone(), Handle::current());
        let (seen, listener) = recorder();
        resolver.subscribe(listener);

        let handle = resolver.fetch(&config("alice")).unwrap();
        tokio::task::yield_now().await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(!resolver.is_pending());
        assert!(seen.lock().unwrap().is_empty());

        // The queued listener is served by the next request.
        resolver.fetch(&config("alice")).unwrap().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Profile::new("alice", None)]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_resolve_releases_in_flight_slot() {
        let source = Arc::new(MockSource {
            slow_token: Some(("alice", Duration::from_millis(100))),
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source.clone(), Handle::current());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), resolver.resolve(&config("alice")))
                .await;
        assert!(timed_out.is_err());
        assert!(!resolver.is_pending());

        resolver.fetch(&config("alice")).unwrap().await.unwrap();
        assert_eq!(resolver.cached(), Some(Profile::new("alice", None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_stale_request_keeps_newer_one_pending() {
        let source = Arc::new(MockSource {
            slow_token: Some(("alice", Duration::from_millis(100))),
            ..MockSource::new()
        });
        let resolver = ProfileResolver::new(source, Handle::current());

        let stale = resolver.fetch(&config("bob")).unwrap();
        let current = resolver.fetch(&config("alice")).unwrap();
        stale.abort();
        let _ = stale.await;

        assert!(resolver.is_pending());
        assert!(resolver.fetch(&config("alice")).is_none());
        current.await.unwrap();
        assert_eq!(resolver.cached(), Some(Profile::new("alice", None)));
    }

    #[tokio::test]
    async fn test_cleared_listeners_are_not_called() {
        let resolver = ProfileResolver::new(Arc::new(MockSource::new()), Handle::current());
        let (seen, listener) = recorder();
        resolver.subscribe(listener);

        resolver.clear_listeners();
        resolver.resolve(&config("alice")).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
