use super::model::Profile;
use crate::config::SessionConfig;
use crate::error::Result;

/// A collaborator that can fetch the profile for a session.
///
/// Implementations report every failure as an error
/// (`WootError::ProfileFetchFailed`); falling back to the placeholder is the
/// caller's decision.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetches the profile of the user the access token belongs to.
    async fn fetch_profile(&self, config: &SessionConfig) -> Result<Profile>;
}
