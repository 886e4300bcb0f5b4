//! Error taxonomy for the gate
//!
//! Provider-facing failures (`ProviderError`, `CheckError`) never leave the
//! identity verifier; they are folded into a [`RejectionReason`] so the
//! dispatcher only ever decides between "accepted" and "rejected".

use thiserror::Error;

/// Startup configuration errors. Any of these stops the process before it binds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting `{0}` is missing")]
    Missing(&'static str),

    #[error("setting `{field}` is invalid: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to load view templates: {0}")]
    Views(String),
}

/// Failures talking to the provider's OAuth and profile endpoints
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider responded with status {status}")]
    Status { status: u16 },

    #[error("provider refused the authorization code: {0}")]
    Refused(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether the provider was unreachable or broken, as opposed to refusing us
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::InvalidResponse(_) => true,
            Self::Status { status } => *status >= 500,
            Self::Refused(_) => false,
        }
    }
}

/// The relationship query errored; distinct from a negative answer
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("relationship query timed out")]
    Timeout,

    #[error("relationship query failed: {0}")]
    Transport(String),

    #[error("relationship query returned server error {status}")]
    ServerError { status: u16 },

    #[error("cannot build relationship query URL from {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Why a login attempt did not produce an accepted identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// Token exchange or profile fetch failed at the transport level, timed out or hit a 5xx
    #[error("identity provider unavailable")]
    ProviderUnavailable,

    /// The provider refused the authorization code
    #[error("authorization code rejected by provider")]
    InvalidGrant,

    /// The identity does not satisfy the relationship predicate
    #[error("identity is not entitled")]
    NotEntitled,

    /// The relationship query itself failed
    #[error("entitlement check failed")]
    CheckFailed,

    /// The provider reported an error instead of a code, or sent no code
    #[error("authorization denied by provider")]
    AuthorizationDenied,

    /// The callback `state` did not match the one issued for this browser
    #[error("callback state did not match")]
    InvalidState,
}

impl RejectionReason {
    /// Short machine-readable label used in log lines
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "provider_unavailable",
            Self::InvalidGrant => "invalid_grant",
            Self::NotEntitled => "not_entitled",
            Self::CheckFailed => "check_failed",
            Self::AuthorizationDenied => "authorization_denied",
            Self::InvalidState => "invalid_state",
        }
    }

    /// Whether this rejection points at a degraded provider rather than the user
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::ProviderUnavailable | Self::CheckFailed)
    }
}

impl From<ProviderError> for RejectionReason {
    fn from(err: ProviderError) -> Self {
        if err.is_unavailable() {
            Self::ProviderUnavailable
        } else {
            Self::InvalidGrant
        }
    }
}

impl From<CheckError> for RejectionReason {
    fn from(_: CheckError) -> Self {
        Self::CheckFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_classify() {
        assert_eq!(
            RejectionReason::from(ProviderError::Status { status: 502 }),
            RejectionReason::ProviderUnavailable
        );
        assert_eq!(
            RejectionReason::from(ProviderError::Status { status: 401 }),
            RejectionReason::InvalidGrant
        );
        assert_eq!(
            RejectionReason::from(ProviderError::Refused("bad_verification_code".into())),
            RejectionReason::InvalidGrant
        );
        assert_eq!(
            RejectionReason::from(ProviderError::InvalidResponse("no token".into())),
            RejectionReason::ProviderUnavailable
        );
    }

    #[test]
    fn test_check_errors_fail_closed() {
        assert_eq!(
            RejectionReason::from(CheckError::Timeout),
            RejectionReason::CheckFailed
        );
        assert_eq!(
            RejectionReason::from(CheckError::ServerError { status: 503 }),
            RejectionReason::CheckFailed
        );
    }

    #[test]
    fn test_degraded_reasons() {
        assert!(RejectionReason::CheckFailed.is_degraded());
        assert!(RejectionReason::ProviderUnavailable.is_degraded());
        assert!(!RejectionReason::NotEntitled.is_degraded());
        assert!(!RejectionReason::InvalidState.is_degraded());
    }
}
