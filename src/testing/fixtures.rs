//! Test fixtures providing pre-built test objects

use crate::entitlement::EntitlementChecker;
use crate::models::Identity;
use crate::oauth::IdentityProvider;
use crate::routes::configure_services;
use crate::session::SessionManager;
use crate::settings::{Credentials, GateSettings};
use crate::verifier::IdentityVerifier;
use crate::views::ViewRenderer;
use actix_web::web;
use std::sync::Arc;

use super::constants::{
    TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_LOGIN, TEST_ORGANIZATION, TEST_PROVIDER_USER_ID,
    TEST_SESSION_SECRET,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Valid settings with every secret filled in and insecure cookies
    #[must_use]
    pub fn settings() -> GateSettings {
        let mut settings = GateSettings::default();
        settings.provider.client_id = TEST_CLIENT_ID.to_string();
        settings.provider.client_secret = TEST_CLIENT_SECRET.to_string();
        settings.provider.organization = TEST_ORGANIZATION.to_string();
        settings.session.session_secret = TEST_SESSION_SECRET.to_string();
        settings.application.redirect_base_url = "http://localhost:3000".to_string();
        settings.cookies.secure = false;
        settings
    }

    /// # Panics
    ///
    /// Panics if the fixture constants are empty
    #[must_use]
    pub fn credentials() -> Credentials {
        Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET, TEST_SESSION_SECRET)
            .expect("fixture credentials are non-empty")
    }

    /// The identity the mock provider reports
    #[must_use]
    pub fn identity() -> Identity {
        Identity {
            provider_user_id: TEST_PROVIDER_USER_ID.to_string(),
            login: TEST_LOGIN.to_string(),
            display_name: "The Octocat".to_string(),
            raw_profile: serde_json::json!({
                "id": 583_231,
                "login": TEST_LOGIN,
                "name": "The Octocat",
                "type": "User"
            }),
        }
    }

    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::new(&Self::credentials(), false, 24).expect("24h is a valid session duration")
    }
}

/// Application state wired the way `main` wires it, with pluggable provider and checker
#[derive(Clone)]
pub struct TestApp {
    pub session_manager: web::Data<SessionManager>,
    pub verifier: web::Data<IdentityVerifier>,
    pub views: web::Data<ViewRenderer>,
}

impl TestApp {
    /// # Panics
    ///
    /// Panics if the built-in views fail to compile
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        checker: Arc<dyn EntitlementChecker>,
    ) -> Self {
        Self {
            session_manager: web::Data::new(TestFixtures::session_manager()),
            verifier: web::Data::new(IdentityVerifier::new(provider, checker, TEST_ORGANIZATION)),
            views: web::Data::new(
                ViewRenderer::builtin(TEST_ORGANIZATION).expect("built-in views compile"),
            ),
        }
    }

    /// Register app data and routes, for `App::new().configure(|cfg| app.configure(cfg))`
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.session_manager.clone())
            .app_data(self.verifier.clone())
            .app_data(self.views.clone())
            .configure(configure_services);
    }
}
