// Centralized logging for the login flow. Tokens, secrets and cookie values never reach these lines.
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::error::{ProviderError, RejectionReason};
use crate::routes::FlowState;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log that a browser was sent to the provider
    pub fn log_login_started(had_session: bool) {
        if had_session {
            info!("🔑 Login started, current session kept until the callback");
        } else {
            info!("🔑 Login started");
        }
    }

    /// Log OAuth URL building
    pub fn log_authorization_url_built(scopes: &str) {
        debug!("🔍 Built authorization URL with scopes: {scopes}");
    }

    /// Log the parts of a callback that decide how it is handled
    pub fn log_callback_received(has_code: bool, provider_error: Option<&str>) {
        match provider_error {
            Some(err) => warn!("↩️  Callback carried provider error: {err}"),
            None => debug!("↩️  Callback received (code present: {has_code})"),
        }
    }

    /// Log token exchange start
    pub fn log_token_exchange_start() {
        debug!("🔄 Exchanging authorization code for a delegated token");
    }

    pub fn log_token_exchange_failed(status: u16, err: &ProviderError) {
        warn!("Token exchange failed (HTTP {status}): {err}");
    }

    pub fn log_profile_fetched(login: &str) {
        debug!("Fetched provider profile for {login}");
    }

    /// Log the outcome of the relationship query
    pub fn log_entitlement_verdict(login: &str, organization: &str, member: bool) {
        if member {
            info!("✅ {login} follows {organization}");
        } else {
            info!("⛔ {login} does not follow {organization}");
        }
    }

    /// Log a rejected login, at error level when the provider is to blame
    pub fn log_rejection(reason: RejectionReason, login: Option<&str>) {
        let who = login.unwrap_or("<unknown>");
        if reason.is_degraded() {
            error!(
                "Login rejected for {who}: {reason} [{}] (provider degraded)",
                reason.as_str()
            );
        } else {
            info!("Login rejected for {who}: {reason} [{}]", reason.as_str());
        }
    }

    pub fn log_session_attached(login: &str, expires_at: DateTime<Utc>) {
        info!("🎫 Session attached for {login}, expires at {}", expires_at.to_rfc3339());
    }

    pub fn log_session_destroyed(removed: bool) {
        if removed {
            info!("🚪 Session destroyed");
        } else {
            debug!("🚪 Logout without a live session");
        }
    }

    pub fn log_transition(from: FlowState, to: FlowState) {
        debug!("Flow {from} -> {to}");
    }

    /// Log a gated request that had no valid session
    pub fn log_gate_denied(path: &str) {
        debug!("🔒 No valid session for {path}, redirecting to start page");
    }
}
