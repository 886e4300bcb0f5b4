use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    HttpRequest,
};
use anyhow::Result;

use crate::oauth::OAuthState;
use crate::utils::crypto::{
    decrypt_data, derive_key, encrypt_data, sign_value, verify_signed_value, ENCRYPTION_KEY_SIZE,
};

/// Cookie carrying the signed session id
pub const COOKIE_NAME: &str = "followgate_session";
/// Cookie carrying the encrypted state of an in-flight login
pub const OAUTH_STATE_COOKIE: &str = "followgate_oauth_state";

const SESSION_SIGNING_PURPOSE: &str = "followgate-session-cookie";
const STATE_SEALING_PURPOSE: &str = "followgate-oauth-state";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::hours(24),
        }
    }
}

/// Builds and reads the gate's cookies
///
/// Session cookies hold only an HMAC-signed session id. The login state
/// cookie is AES-256-GCM sealed. Both keys are derived from the session
/// secret, so rotating the secret invalidates every outstanding cookie.
#[derive(Clone)]
pub struct CookieFactory {
    signing_key: [u8; ENCRYPTION_KEY_SIZE],
    sealing_key: [u8; ENCRYPTION_KEY_SIZE],
    cookie_secure: bool,
    session_duration_hours: u64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(session_secret: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        Self {
            signing_key: derive_key(session_secret, SESSION_SIGNING_PURPOSE),
            sealing_key: derive_key(session_secret, STATE_SEALING_PURPOSE),
            cookie_secure,
            session_duration_hours,
        }
    }

    fn build_cookie(&self, name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Create the cookie that binds a browser to `session_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the id cannot be signed
    pub fn create_session_cookie(&self, session_id: &str) -> Result<Cookie<'static>> {
        let value = sign_value(session_id, &self.signing_key)?;
        Ok(self.build_cookie(
            COOKIE_NAME,
            value,
            CookieOptions {
                max_age: Duration::hours(i64::try_from(self.session_duration_hours).unwrap_or(24)),
                ..Default::default()
            },
        ))
    }

    /// Verified session id carried by the request, if any
    ///
    /// Unsigned, forged or re-keyed cookies read as absent.
    #[must_use]
    pub fn session_id_from_request(&self, req: &HttpRequest) -> Option<String> {
        let cookie = req.cookie(COOKIE_NAME)?;
        let session_id = verify_signed_value(cookie.value(), &self.signing_key);
        if session_id.is_none() && !cookie.value().is_empty() {
            log::warn!("Ignoring session cookie with invalid signature");
        }
        session_id.map(str::to_string)
    }

    /// Create a temporary cookie for storing OAuth state during the OAuth flow
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_temporary_state_cookie(&self, oauth_state: &OAuthState) -> Result<Cookie<'static>> {
        let value = encrypt_data(oauth_state, &self.sealing_key)?;
        let cookie = self.build_cookie(
            OAUTH_STATE_COOKIE,
            value,
            CookieOptions {
                max_age: Duration::seconds(OAuthState::MAX_AGE_SECS),
                ..Default::default()
            },
        );

        log::debug!(
            "Creating temporary state cookie: secure={}, encrypted_len={}",
            self.cookie_secure,
            cookie.value().len()
        );

        Ok(cookie)
    }

    /// Decrypted login state carried by the request, if any
    #[must_use]
    pub fn oauth_state_from_request(&self, req: &HttpRequest) -> Option<OAuthState> {
        let cookie = req.cookie(OAUTH_STATE_COOKIE)?;
        match decrypt_data::<OAuthState>(cookie.value(), &self.sealing_key) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("Failed to decrypt OAuth state cookie: {e}");
                None
            }
        }
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(COOKIE_NAME, self.cookie_secure)
    }

    /// Create an expired cookie to clear the login state
    #[must_use]
    pub fn create_expired_state_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(OAUTH_STATE_COOKIE, self.cookie_secure)
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(-1))
        .finish()
}
