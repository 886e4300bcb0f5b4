// OAuth callback handler
use crate::error::RejectionReason;
use crate::oauth::OAuthCallback;
use crate::routes::{FlowState, PROTECTED_VIEW, REJECTED_VIEW};
use crate::session::SessionManager;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use crate::verifier::IdentityVerifier;
use actix_web::{cookie::Cookie, web, HttpRequest, HttpResponse};

/// Complete a login started by `start_login`
///
/// Accepted identities get a fresh session and are sent to the protected
/// view. Every rejection destroys any existing session and lands on the
/// rejected view. The login state cookie is cleared either way, so a callback
/// can be used at most once. A query string that does not parse is treated
/// as a denied authorization.
pub async fn oauth_callback(
    query: Result<web::Query<OAuthCallback>, actix_web::Error>,
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
    verifier: web::Data<IdentityVerifier>,
) -> HttpResponse {
    let from = FlowState::of(&req, &session_manager);
    let clear_state = session_manager.clear_login_state();

    let callback = match query {
        Ok(query) => query.into_inner(),
        Err(e) => {
            log::warn!("Malformed callback query: {e}");
            LoggingHelper::log_rejection(RejectionReason::AuthorizationDenied, None);
            return reject(&req, &session_manager, from, clear_state);
        }
    };
    LoggingHelper::log_callback_received(callback.code.is_some(), callback.error.as_deref());

    let outcome = match validate_callback(&callback, &session_manager, &req) {
        Ok(code) => verifier.complete_login(code).await,
        Err(reason) => {
            LoggingHelper::log_rejection(reason, None);
            Err(reason)
        }
    };

    let identity = match outcome {
        Ok(identity) => identity,
        Err(_) => return reject(&req, &session_manager, from, clear_state),
    };

    match session_manager.attach(&req, &identity) {
        Ok((_, session_cookie)) => {
            LoggingHelper::log_transition(from, FlowState::Authenticated);
            ResponseBuilder::redirect(PROTECTED_VIEW)
                .with_cookies([session_cookie, clear_state])
                .build()
        }
        Err(e) => {
            log::error!("Accepted {} but could not attach a session: {e}", identity.login);
            reject(&req, &session_manager, from, clear_state)
        }
    }
}

/// Check the callback parameters and return the authorization code
///
/// A provider-reported error or missing code is `AuthorizationDenied`; a
/// missing, stale or mismatched `state` is `InvalidState`.
fn validate_callback<'a>(
    callback: &'a OAuthCallback,
    session_manager: &SessionManager,
    req: &HttpRequest,
) -> Result<&'a str, RejectionReason> {
    if let Some(error) = &callback.error {
        log::warn!(
            "Provider denied authorization: {error} ({})",
            callback.error_description.as_deref().unwrap_or("no description")
        );
        return Err(RejectionReason::AuthorizationDenied);
    }

    let Some(received_state) = callback.state.as_deref() else {
        log::warn!("Callback without state parameter");
        return Err(RejectionReason::InvalidState);
    };

    match session_manager.login_state(req) {
        Some(expected) if expected.matches(received_state) => {}
        Some(_) => {
            log::warn!("Callback state does not match the state issued to this browser");
            return Err(RejectionReason::InvalidState);
        }
        None => {
            log::warn!("Callback without a pending login for this browser");
            return Err(RejectionReason::InvalidState);
        }
    }

    callback
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or(RejectionReason::AuthorizationDenied)
}

fn reject(
    req: &HttpRequest,
    session_manager: &SessionManager,
    from: FlowState,
    clear_state: Cookie<'static>,
) -> HttpResponse {
    let clear_session = session_manager.destroy(req);
    LoggingHelper::log_transition(from, FlowState::Rejected);
    ResponseBuilder::redirect(REJECTED_VIEW)
        .with_cookies([clear_session, clear_state])
        .build()
}
