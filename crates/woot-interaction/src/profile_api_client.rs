//! ProfileApiClient - REST client for the signed-in user's profile.
//!
//! Issues `GET {api_host}/api/v1/profile` authenticated with the
//! `api_access_token` header and maps the response onto a [`Profile`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use woot_core::config::{ResolverSettings, SessionConfig, redact};
use woot_core::error::{Result, WootError};
use woot_core::profile::{Profile, ProfileSource};

const ACCESS_TOKEN_HEADER: &str = "api_access_token";

/// `ProfileSource` backed by the Chatwoot REST API.
#[derive(Clone)]
pub struct ProfileApiClient {
    client: Client,
    request_timeout: Duration,
}

/// Body of a successful profile response.
///
/// Unknown fields are ignored. A known field that is not a string reads as
/// missing instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub available_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar_url: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl ProfileResponse {
    /// Converts the response into a profile.
    ///
    /// Names are checked in the order `name`, `available_name`,
    /// `display_name`, and the last non-empty one wins, so the effective
    /// precedence is `display_name` > `available_name` > `name` > placeholder.
    pub fn into_profile(self) -> Profile {
        let mut name = None;
        for candidate in [self.name, self.available_name, self.display_name] {
            if let Some(value) = candidate.filter(|value| !value.trim().is_empty()) {
                name = Some(value);
            }
        }

        match name {
            Some(name) => Profile::new(name, self.avatar_url),
            None => Profile::new(String::new(), self.avatar_url),
        }
    }
}

/// Parses a profile response body.
///
/// # Errors
///
/// Returns `WootError::ProfileFetchFailed` for an empty body, invalid JSON or
/// a body that is not a JSON object.
pub fn parse_profile_body(body: &str) -> Result<Profile> {
    if body.trim().is_empty() {
        return Err(WootError::profile_fetch("empty response body"));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| WootError::profile_fetch(format!("malformed JSON: {}", e)))?;
    if !value.is_object() {
        return Err(WootError::profile_fetch("response body is not a JSON object"));
    }

    let response: ProfileResponse = serde_json::from_value(value)
        .map_err(|e| WootError::profile_fetch(format!("unexpected profile shape: {}", e)))?;
    Ok(response.into_profile())
}

impl ProfileApiClient {
    /// Creates a client with its own connection pool.
    pub fn new(settings: &ResolverSettings) -> Self {
        Self {
            client: Client::new(),
            request_timeout: settings.request_timeout,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[async_trait]
impl ProfileSource for ProfileApiClient {
    async fn fetch_profile(&self, config: &SessionConfig) -> Result<Profile> {
        let url = config.profile_url();
        tracing::debug!(
            url = %url,
            access_token = %redact(config.access_token()),
            "Fetching profile"
        );

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(ACCESS_TOKEN_HEADER, config.access_token())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| WootError::profile_fetch(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WootError::profile_fetch(format!(
                "profile endpoint returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WootError::profile_fetch(format!("failed to read body: {}", e)))?;

        parse_profile_body(&body)
    }
}
