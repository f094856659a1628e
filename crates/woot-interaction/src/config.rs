//! SDK configuration file management.
//!
//! Host shells that ship their session settings as a TOML file load them
//! here. The file is parsed into plain DTOs and then validated into the
//! domain types of `woot_core::config`.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use woot_core::config::{InjectionSettings, ResolverSettings, SdkSettings, SessionConfig};
use woot_core::error::{Result, WootError};

/// Validated contents of an SDK config file.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub session: SessionConfig,
    pub settings: SdkSettings,
}

/// Root structure of the config file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    session: SessionSection,
    #[serde(default)]
    resolver: Option<ResolverSection>,
    #[serde(default)]
    injection: Option<InjectionSection>,
}

#[derive(Deserialize)]
struct SessionSection {
    account_id: i64,
    api_host: String,
    access_token: String,
    #[serde(default)]
    pubsub_token: String,
    websocket_url: String,
}

// Hand-written so tokens never reach a log through `{:?}`.
impl std::fmt::Debug for SessionSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSection")
            .field("account_id", &self.account_id)
            .field("api_host", &self.api_host)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ResolverSection {
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct InjectionSection {
    #[serde(default)]
    deferred_reinjection_ms: Option<Vec<u64>>,
}

impl ConfigFile {
    fn into_config(self) -> Result<SdkConfig> {
        let session = SessionConfig::new(
            self.session.account_id,
            self.session.api_host,
            self.session.access_token,
            self.session.pubsub_token,
            self.session.websocket_url,
        )?;

        let mut resolver = ResolverSettings::default();
        if let Some(secs) = self.resolver.and_then(|r| r.request_timeout_secs) {
            if secs == 0 {
                return Err(WootError::invalid_config(
                    "resolver.request_timeout_secs must be greater than zero",
                ));
            }
            resolver.request_timeout = Duration::from_secs(secs);
        }

        let mut injection = InjectionSettings::default();
        if let Some(delays) = self.injection.and_then(|i| i.deferred_reinjection_ms) {
            injection.deferred_reinjection =
                delays.into_iter().map(Duration::from_millis).collect();
        }

        Ok(SdkConfig {
            session,
            settings: SdkSettings {
                resolver,
                injection,
            },
        })
    }
}

/// Parses and validates SDK configuration from TOML text.
pub fn parse_sdk_config(content: &str) -> Result<SdkConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    file.into_config()
}

/// Loads the SDK configuration file at `path`.
pub fn load_sdk_config(path: &Path) -> Result<SdkConfig> {
    if !path.exists() {
        return Err(WootError::io(format!(
            "Configuration file not found at: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        WootError::io(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_sdk_config(&content)
}
