// Access gate for protected routes
use crate::models::SessionRecord;
use crate::routes::START_PAGE;
use crate::session::SessionManager;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::{dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{ready, Ready};
use thiserror::Error;

/// Extractor that only succeeds for requests carrying a live authenticated session
///
/// Taking it as a handler argument is what makes a route protected. Requests
/// without a valid session are answered with a redirect to the start page.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub SessionRecord);

impl AuthenticatedSession {
    #[must_use]
    pub fn record(&self) -> &SessionRecord {
        &self.0
    }
}

/// Gate failure; renders as a redirect to the start page, never an error page
#[derive(Debug, Error)]
#[error("no authenticated session")]
pub struct GateRejection;

impl ResponseError for GateRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        ResponseBuilder::redirect(START_PAGE).build()
    }
}

impl FromRequest for AuthenticatedSession {
    type Error = GateRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(session_manager) = req.app_data::<web::Data<SessionManager>>() else {
            log::error!("SessionManager missing from app data, denying {}", req.path());
            return ready(Err(GateRejection));
        };

        let session = session_manager
            .current_session(req)
            .filter(SessionRecord::is_authenticated);

        ready(session.map(Self).ok_or_else(|| {
            LoggingHelper::log_gate_denied(req.path());
            GateRejection
        }))
    }
}
