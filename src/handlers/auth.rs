// Login start and logout handlers
use crate::routes::{FlowState, REJECTED_VIEW, START_PAGE};
use crate::session::SessionManager;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use crate::verifier::IdentityVerifier;
use actix_web::{web, HttpRequest, HttpResponse};

/// Begin a login: bind fresh state to the browser and send it to the
/// provider's consent page
///
/// A current session survives until the callback, which either replaces it
/// with a fresh one or destroys it.
pub async fn start_login(
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
    verifier: web::Data<IdentityVerifier>,
) -> HttpResponse {
    let from = FlowState::of(&req, &session_manager);
    LoggingHelper::log_login_started(from == FlowState::Authenticated);

    let (state, state_cookie) = match session_manager.begin_login_state() {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("Cannot start login: {e}");
            return ResponseBuilder::redirect(REJECTED_VIEW).build();
        }
    };

    match verifier.begin_login(&state.state) {
        Ok(authorization_url) => {
            LoggingHelper::log_transition(from, FlowState::PendingCallback);
            ResponseBuilder::redirect(&authorization_url)
                .with_cookie(state_cookie)
                .build()
        }
        Err(reason) => {
            LoggingHelper::log_rejection(reason, None);
            ResponseBuilder::redirect(REJECTED_VIEW).build()
        }
    }
}

/// Destroy the session, then redirect to the start page
///
/// Safe to call without a session.
pub async fn logout(req: HttpRequest, session_manager: web::Data<SessionManager>) -> HttpResponse {
    let from = FlowState::of(&req, &session_manager);
    let clear_session = session_manager.destroy(&req);
    LoggingHelper::log_transition(from, FlowState::Anonymous);

    ResponseBuilder::redirect(START_PAGE)
        .with_cookie(clear_session)
        .build()
}
