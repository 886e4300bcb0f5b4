//! Session Manager
//!
//! Owns the server-side session store and the cookies that point at it. A
//! browser is authenticated exactly when its signed session cookie names a
//! live record; records are only ever written for accepted identities.

use crate::models::{Identity, SessionIdentity, SessionRecord};
use crate::oauth::OAuthState;
use crate::session::cookie::CookieFactory;
use crate::session::store::SessionStore;
use crate::settings::Credentials;
use crate::utils::crypto::{generate_csrf_token, generate_nonce};
use crate::utils::logging::LoggingHelper;
use actix_web::{cookie::Cookie, HttpRequest};
use std::sync::Arc;
use thiserror::Error;

/// Bytes of entropy in a session id
const SESSION_ID_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to issue session cookie: {0}")]
    Cookie(#[source] anyhow::Error),

    #[error("failed to issue login state cookie: {0}")]
    StateCookie(#[source] anyhow::Error),

    #[error("session duration of {0} hours is out of range")]
    Duration(u64),
}

#[derive(Clone)]
pub struct SessionManager {
    cookie_factory: CookieFactory,
    store: Arc<SessionStore>,
    session_duration: chrono::TimeDelta,
}

impl SessionManager {
    /// # Errors
    ///
    /// Returns `SessionError::Duration` if the lifetime is zero or does not fit a `TimeDelta`
    pub fn new(
        credentials: &Credentials,
        cookie_secure: bool,
        session_duration_hours: u64,
    ) -> Result<Self, SessionError> {
        let session_duration = i64::try_from(session_duration_hours)
            .ok()
            .filter(|hours| *hours > 0)
            .and_then(chrono::TimeDelta::try_hours)
            .ok_or(SessionError::Duration(session_duration_hours))?;

        Ok(Self {
            cookie_factory: CookieFactory::new(
                credentials.session_secret(),
                cookie_secure,
                session_duration_hours,
            ),
            store: Arc::new(SessionStore::new()),
            session_duration,
        })
    }

    // =========================================================================
    // Authenticated sessions
    // =========================================================================

    /// Attach an accepted identity to the browser behind `req`
    ///
    /// Always issues a fresh session id; any session the request already
    /// carried is discarded so an id observed before login is useless after.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie cannot be signed
    pub fn attach(
        &self,
        req: &HttpRequest,
        identity: &Identity,
    ) -> Result<(SessionRecord, Cookie<'static>), SessionError> {
        if let Some(previous) = self.cookie_factory.session_id_from_request(req) {
            self.store.remove(&previous);
        }

        let session_id = generate_nonce(SESSION_ID_BYTES);
        let cookie = self
            .cookie_factory
            .create_session_cookie(&session_id)
            .map_err(SessionError::Cookie)?;

        let record = SessionRecord::new(
            session_id,
            SessionIdentity::from(identity),
            self.session_duration,
        );
        self.store.insert(record.clone());

        let purged = self.store.purge_expired();
        if purged > 0 {
            log::debug!("Purged {purged} expired sessions");
        }

        LoggingHelper::log_session_attached(&record.identity.login, record.expires_at);
        Ok((record, cookie))
    }

    /// Live session referenced by the request, if any
    #[must_use]
    pub fn current_session(&self, req: &HttpRequest) -> Option<SessionRecord> {
        let session_id = self.cookie_factory.session_id_from_request(req)?;
        self.store.get(&session_id)
    }

    #[must_use]
    pub fn is_authenticated(&self, req: &HttpRequest) -> bool {
        self.current_session(req)
            .is_some_and(|record| record.is_authenticated())
    }

    /// Remove the request's session and return the cookie that clears it
    ///
    /// Destroying an absent or already destroyed session is a no-op.
    #[must_use]
    pub fn destroy(&self, req: &HttpRequest) -> Cookie<'static> {
        let removed = self
            .cookie_factory
            .session_id_from_request(req)
            .is_some_and(|session_id| self.store.remove(&session_id));
        LoggingHelper::log_session_destroyed(removed);
        self.cookie_factory.create_expired_cookie()
    }

    // =========================================================================
    // Login state
    // =========================================================================

    /// Start a login attempt: fresh anti-forgery state plus the cookie binding it to the browser
    ///
    /// # Errors
    ///
    /// Returns an error if the state cookie cannot be sealed
    pub fn begin_login_state(&self) -> Result<(OAuthState, Cookie<'static>), SessionError> {
        let state = OAuthState::new(generate_csrf_token());
        let cookie = self
            .cookie_factory
            .create_temporary_state_cookie(&state)
            .map_err(SessionError::StateCookie)?;
        Ok((state, cookie))
    }

    /// Login state previously bound to this browser
    #[must_use]
    pub fn login_state(&self, req: &HttpRequest) -> Option<OAuthState> {
        self.cookie_factory.oauth_state_from_request(req)
    }

    #[must_use]
    pub fn clear_login_state(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_state_cookie()
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
