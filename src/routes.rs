//! Route table and the per-request login flow state

use crate::handlers::{auth, callback, pages};
use crate::session::SessionManager;
use actix_web::{web, HttpRequest};
use std::fmt;

/// Public start page
pub const START_PAGE: &str = "/";
/// Begins the provider login
pub const LOGIN: &str = "/auth/provider";
/// Provider redirect target
pub const CALLBACK: &str = crate::settings::CALLBACK_PATH;
/// Gated page for followers
pub const PROTECTED_VIEW: &str = "/private";
/// Public page shown after a rejected login
pub const REJECTED_VIEW: &str = "/notFollow";
pub const LOGOUT: &str = "/logout";
pub const PING: &str = "/ping";

/// Where a browser stands in the login flow
///
/// Nothing stores this; it is rebuilt from the request's cookies and used for
/// logging transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Anonymous,
    PendingCallback,
    Authenticated,
    Rejected,
}

impl FlowState {
    /// State of the browser behind `req` before the current request is handled
    #[must_use]
    pub fn of(req: &HttpRequest, session_manager: &SessionManager) -> Self {
        if session_manager.is_authenticated(req) {
            Self::Authenticated
        } else if session_manager.login_state(req).is_some() {
            Self::PendingCallback
        } else {
            Self::Anonymous
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous",
            Self::PendingCallback => "pending_callback",
            Self::Authenticated => "authenticated",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Mount every route on an app or test service
///
/// Expects `SessionManager`, `IdentityVerifier` and `ViewRenderer` as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route(START_PAGE, web::get().to(pages::index))
        .route(LOGIN, web::get().to(auth::start_login))
        .route(CALLBACK, web::get().to(callback::oauth_callback))
        .route(PROTECTED_VIEW, web::get().to(pages::private_view))
        .route(REJECTED_VIEW, web::get().to(pages::not_follow))
        .route(LOGOUT, web::get().to(auth::logout))
        .route(PING, web::get().to(pages::health));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestFixtures, TestRequestBuilder};

    #[test]
    fn test_flow_state_from_cookies() {
        let manager = TestFixtures::session_manager();
        assert_eq!(
            FlowState::of(&TestRequestBuilder::empty(), &manager),
            FlowState::Anonymous
        );

        let (_, state_cookie) = manager.begin_login_state().unwrap();
        assert_eq!(
            FlowState::of(&TestRequestBuilder::with_cookie(state_cookie), &manager),
            FlowState::PendingCallback
        );

        let (_, session_cookie) = manager
            .attach(&TestRequestBuilder::empty(), &TestFixtures::identity())
            .unwrap();
        assert_eq!(
            FlowState::of(&TestRequestBuilder::with_cookie(session_cookie), &manager),
            FlowState::Authenticated
        );
    }

    #[test]
    fn test_callback_route_matches_settings() {
        assert_eq!(CALLBACK, "/auth/provider/callback");
        assert_eq!(FlowState::PendingCallback.to_string(), "pending_callback");
    }
}
