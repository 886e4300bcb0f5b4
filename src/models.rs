use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Bearer token issued by the provider for one code exchange
///
/// Deliberately neither `Clone`, `Serialize` nor `Display`: it lives only as
/// long as the verification that obtained it and cannot end up in a session
/// record or a log line by accident.
pub struct DelegatedToken(String);

impl DelegatedToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw value, for building the `Authorization` header only
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for DelegatedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DelegatedToken(<redacted>)")
    }
}

/// Identity reported by the provider during the handshake
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub provider_user_id: String,
    pub login: String,
    pub display_name: String,
    /// Full profile document as returned by the provider
    pub raw_profile: serde_json::Value,
}

/// Subset of an [`Identity`] kept in the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub provider_user_id: String,
    pub login: String,
    pub display_name: String,
}

impl From<&Identity> for SessionIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            provider_user_id: identity.provider_user_id.clone(),
            login: identity.login.clone(),
            display_name: identity.display_name.clone(),
        }
    }
}

/// Server-side record of an authenticated browser session
///
/// Records are only ever created for accepted identities, so holding a live
/// record is what "authenticated" means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub identity: SessionIdentity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(session_id: String, identity: SessionIdentity, lifetime: chrono::Duration) -> Self {
        let created_at = Utc::now();
        Self {
            session_id,
            identity,
            created_at,
            expires_at: created_at + lifetime,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.is_expired()
    }
}

/// Relationship verdict for one entitlement check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementVerdict {
    Member,
    NotMember,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestFixtures;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = DelegatedToken::new("gho_supersecret");
        assert_eq!(format!("{token:?}"), "DelegatedToken(<redacted>)");
        assert_eq!(token.secret(), "gho_supersecret");
    }

    #[test]
    fn test_session_identity_drops_raw_profile() {
        let identity = TestFixtures::identity();
        let session_identity = SessionIdentity::from(&identity);

        let json = serde_json::to_value(&session_identity).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["login"], "octocat");
        assert!(!object.contains_key("raw_profile"));
    }

    #[test]
    fn test_session_record_expiry() {
        let identity = SessionIdentity::from(&TestFixtures::identity());
        let live = SessionRecord::new("a".into(), identity.clone(), chrono::Duration::hours(1));
        let dead = SessionRecord::new("b".into(), identity, chrono::Duration::seconds(-1));

        assert!(live.is_authenticated());
        assert!(dead.is_expired());
        assert!(!dead.is_authenticated());
    }
}
