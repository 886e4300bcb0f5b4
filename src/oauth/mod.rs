//! OAuth authorization-code flow against the identity provider
//!
//! [`IdentityProvider`] is the seam between the verifier and the network:
//! [`ProviderClient`] talks to the real provider, tests plug in mocks.

pub mod client;

pub use client::{provider_api_get, ProviderClient};

use crate::error::ProviderError;
use crate::models::{DelegatedToken, Identity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query parameters the provider sends back to the callback
#[derive(Deserialize, Debug, Default)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Anti-forgery state bound to the browser for the duration of one login
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OAuthState {
    pub state: String,
    pub issued_at: i64,
}

impl OAuthState {
    /// Maximum age of a pending login, matching the state cookie lifetime
    pub const MAX_AGE_SECS: i64 = 600;

    #[must_use]
    pub fn new(state: String) -> Self {
        Self {
            state,
            issued_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether `received` is the state issued for this browser and still fresh
    #[must_use]
    pub fn matches(&self, received: &str) -> bool {
        let age = chrono::Utc::now().timestamp() - self.issued_at;
        (0..=Self::MAX_AGE_SECS).contains(&age) && self.state == received
    }
}

/// Provider operations needed to turn an authorization code into an identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's consent page for this login attempt
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a URL
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Exchange an authorization code for a delegated token
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or refuses the code
    async fn exchange_code(&self, code: &str) -> Result<DelegatedToken, ProviderError>;

    /// Fetch the profile of the user who granted `token`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the profile cannot be parsed
    async fn fetch_profile(&self, token: &DelegatedToken) -> Result<Identity, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_matches_only_same_value() {
        let state = OAuthState::new("abc".to_string());
        assert!(state.matches("abc"));
        assert!(!state.matches("abd"));
        assert!(!state.matches(""));
    }

    #[test]
    fn test_stale_state_does_not_match() {
        let state = OAuthState {
            state: "abc".to_string(),
            issued_at: chrono::Utc::now().timestamp() - OAuthState::MAX_AGE_SECS - 1,
        };
        assert!(!state.matches("abc"));
    }
}
