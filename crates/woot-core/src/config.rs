//! Session configuration and SDK settings.
//!
//! `SessionConfig` is validated once at construction and immutable afterwards.
//! Tokens never appear in `Debug` output; use [`redact`] whenever a secret has
//! to be mentioned in a log line.

use std::fmt;
use std::time::Duration;

use crate::error::{Result, WootError};

const PROFILE_PATH: &str = "/api/v1/profile";

/// Runtime configuration of one chat session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    account_id: i64,
    api_host: String,
    access_token: String,
    pubsub_token: String,
    websocket_url: String,
}

impl SessionConfig {
    /// Creates a validated session configuration.
    ///
    /// # Errors
    ///
    /// Returns `WootError::InvalidConfig` when the account id is not positive,
    /// the access token is empty, or either URL is not absolute.
    pub fn new(
        account_id: i64,
        api_host: impl Into<String>,
        access_token: impl Into<String>,
        pubsub_token: impl Into<String>,
        websocket_url: impl Into<String>,
    ) -> Result<Self> {
        if account_id <= 0 {
            return Err(WootError::invalid_config(format!(
                "account_id must be positive, got {account_id}"
            )));
        }

        let api_host = api_host.into();
        if !has_scheme(&api_host, &["https", "http"]) {
            return Err(WootError::invalid_config(format!(
                "api_host must be an absolute http(s) URL, got '{api_host}'"
            )));
        }
        let api_host = api_host
            .strip_suffix('/')
            .map(str::to_string)
            .unwrap_or(api_host);

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(WootError::invalid_config("access_token must not be empty"));
        }

        let websocket_url = websocket_url.into();
        if !has_scheme(&websocket_url, &["wss", "ws", "https", "http"]) {
            return Err(WootError::invalid_config(format!(
                "websocket_url must be an absolute URL, got '{websocket_url}'"
            )));
        }

        Ok(Self {
            account_id,
            api_host,
            access_token,
            pubsub_token: pubsub_token.into(),
            websocket_url,
        })
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    /// Base URL without a trailing slash.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn pubsub_token(&self) -> &str {
        &self.pubsub_token
    }

    pub fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    /// The REST endpoint the profile is fetched from.
    pub fn profile_url(&self) -> String {
        format!("{}{}", self.api_host, PROFILE_PATH)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("account_id", &self.account_id)
            .field("api_host", &self.api_host)
            .field("access_token", &redact(&self.access_token))
            .field("pubsub_token", &redact(&self.pubsub_token))
            .field("websocket_url", &self.websocket_url)
            .finish()
    }
}

/// Masks a secret for logging.
///
/// Secrets longer than eight characters keep their last four characters so
/// that two tokens can still be told apart in a log.
pub fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count > 8 {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("***{tail}")
    } else {
        "***".to_string()
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes.iter().any(|scheme| {
        url.strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
    })
}

/// Settings for profile resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Upper bound for a single profile request.
    pub request_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Settings for payload delivery into the embedded runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSettings {
    /// Extra deliveries scheduled after each ready/reload signal, measured
    /// from that signal. The widget may install its listeners late.
    pub deferred_reinjection: Vec<Duration>,
}

impl InjectionSettings {
    /// Settings that deliver only at the load boundaries themselves.
    pub fn immediate_only() -> Self {
        Self {
            deferred_reinjection: Vec::new(),
        }
    }
}

impl Default for InjectionSettings {
    fn default() -> Self {
        Self {
            deferred_reinjection: vec![Duration::from_millis(500), Duration::from_millis(1500)],
        }
    }
}

/// All tunables of the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdkSettings {
    pub resolver: ResolverSettings,
    pub injection: InjectionSettings,
}
