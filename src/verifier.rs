//! Identity verification: code exchange, profile fetch and entitlement check
//!
//! This is the only place provider errors are seen. Every failure is folded
//! into a [`RejectionReason`] before it reaches a handler, and the delegated
//! token is dropped when [`IdentityVerifier::complete_login`] returns.

use crate::entitlement::EntitlementChecker;
use crate::error::RejectionReason;
use crate::models::{EntitlementVerdict, Identity};
use crate::oauth::IdentityProvider;
use crate::utils::logging::LoggingHelper;
use std::sync::Arc;

pub struct IdentityVerifier {
    provider: Arc<dyn IdentityProvider>,
    checker: Arc<dyn EntitlementChecker>,
    organization: String,
}

impl IdentityVerifier {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        checker: Arc<dyn EntitlementChecker>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            checker,
            organization: organization.into(),
        }
    }

    /// Authorization URL to send the browser to, bound to `state`
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` if the authorization URL cannot be built
    pub fn begin_login(&self, state: &str) -> Result<String, RejectionReason> {
        self.provider.authorization_url(state).map_err(|e| {
            log::error!("Cannot build authorization URL: {e}");
            RejectionReason::ProviderUnavailable
        })
    }

    /// Turn an authorization code into an accepted identity
    ///
    /// # Errors
    ///
    /// - `ProviderUnavailable` if the provider cannot be reached, times out or
    ///   fails while exchanging the code or fetching the profile
    /// - `InvalidGrant` if the provider refuses the code
    /// - `NotEntitled` if the identity does not follow the organization
    /// - `CheckFailed` if the relationship query itself errors
    pub async fn complete_login(&self, code: &str) -> Result<Identity, RejectionReason> {
        let token = self.provider.exchange_code(code).await.map_err(|e| {
            let reason = RejectionReason::from(e);
            LoggingHelper::log_rejection(reason, None);
            reason
        })?;

        let identity = self.provider.fetch_profile(&token).await.map_err(|e| {
            log::error!("Profile fetch failed: {e}");
            LoggingHelper::log_rejection(RejectionReason::ProviderUnavailable, None);
            RejectionReason::ProviderUnavailable
        })?;
        LoggingHelper::log_profile_fetched(&identity.login);

        match self.checker.check(&token, &self.organization).await {
            Ok(EntitlementVerdict::Member) => {
                LoggingHelper::log_entitlement_verdict(&identity.login, &self.organization, true);
                Ok(identity)
            }
            Ok(EntitlementVerdict::NotMember) => {
                LoggingHelper::log_entitlement_verdict(&identity.login, &self.organization, false);
                LoggingHelper::log_rejection(RejectionReason::NotEntitled, Some(&identity.login));
                Err(RejectionReason::NotEntitled)
            }
            Err(e) => {
                log::error!("Relationship query for {} failed: {e}", identity.login);
                let reason = RejectionReason::from(e);
                LoggingHelper::log_rejection(reason, Some(&identity.login));
                Err(reason)
            }
        }
    }
}
