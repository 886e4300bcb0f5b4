//! In-process fakes for the provider seams

use crate::entitlement::EntitlementChecker;
use crate::error::{CheckError, ProviderError};
use crate::models::{DelegatedToken, EntitlementVerdict, Identity};
use crate::oauth::IdentityProvider;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::constants::{TEST_ACCESS_TOKEN, TEST_CLIENT_ID};
use super::fixtures::TestFixtures;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderBehavior {
    Normal,
    Refusing,
    Unavailable,
    WithoutProfile,
}

/// Identity provider that accepts every code and reports [`TestFixtures::identity`]
pub struct MockIdentityProvider {
    behavior: ProviderBehavior,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            behavior: ProviderBehavior::Normal,
        }
    }

    /// Refuses every code, like an expired or reused authorization code
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            behavior: ProviderBehavior::Refusing,
        }
    }

    /// Token endpoint answers with a server error
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            behavior: ProviderBehavior::Unavailable,
        }
    }

    /// Token exchange works, profile endpoint fails
    #[must_use]
    pub fn without_profile() -> Self {
        Self {
            behavior: ProviderBehavior::WithoutProfile,
        }
    }

    /// Token issued for `code`
    #[must_use]
    pub fn token_for(code: &str) -> String {
        format!("{TEST_ACCESS_TOKEN}-{code}")
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let mut url = url::Url::parse("https://provider.test/login/oauth/authorize")
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", TEST_CLIENT_ID)
            .append_pair("scope", "user:follow")
            .append_pair("state", state);
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<DelegatedToken, ProviderError> {
        match self.behavior {
            ProviderBehavior::Refusing => {
                Err(ProviderError::Refused("bad_verification_code".to_string()))
            }
            ProviderBehavior::Unavailable => Err(ProviderError::Status { status: 503 }),
            ProviderBehavior::Normal | ProviderBehavior::WithoutProfile => {
                Ok(DelegatedToken::new(Self::token_for(code)))
            }
        }
    }

    async fn fetch_profile(&self, _token: &DelegatedToken) -> Result<Identity, ProviderError> {
        if self.behavior == ProviderBehavior::WithoutProfile {
            return Err(ProviderError::Status { status: 502 });
        }
        Ok(TestFixtures::identity())
    }
}

#[derive(Debug, Clone, Copy)]
enum CheckBehavior {
    Member,
    NotMember,
    Failing,
}

/// Entitlement checker with a fixed answer that records every query
pub struct MockEntitlementChecker {
    behavior: CheckBehavior,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockEntitlementChecker {
    fn with_behavior(behavior: CheckBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn member() -> Self {
        Self::with_behavior(CheckBehavior::Member)
    }

    #[must_use]
    pub fn not_member() -> Self {
        Self::with_behavior(CheckBehavior::NotMember)
    }

    /// Every query errors, like a provider outage
    #[must_use]
    pub fn failing() -> Self {
        Self::with_behavior(CheckBehavior::Failing)
    }

    /// Targets queried so far, in order
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    /// Raw token values received so far, in order
    #[must_use]
    pub fn tokens_seen(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl EntitlementChecker for MockEntitlementChecker {
    async fn check(
        &self,
        token: &DelegatedToken,
        target: &str,
    ) -> Result<EntitlementVerdict, CheckError> {
        self.calls
            .lock()
            .push((token.secret().to_string(), target.to_string()));

        match self.behavior {
            CheckBehavior::Member => Ok(EntitlementVerdict::Member),
            CheckBehavior::NotMember => Ok(EntitlementVerdict::NotMember),
            CheckBehavior::Failing => Err(CheckError::ServerError { status: 502 }),
        }
    }
}
