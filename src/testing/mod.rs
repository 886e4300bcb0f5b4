//! Testing utilities for followgate
//!
//! Compiled for unit tests and, behind the `testing` feature, for the
//! integration tests under `tests/`.
//!
//! - [`fixtures`] - settings, identities, session managers and a ready-to-mount app
//! - [`mock`] - in-process identity provider and entitlement checker
//! - [`requests`] - `HttpRequest` builders for extractor and manager tests

pub mod fixtures;
pub mod mock;
pub mod requests;

pub use constants::*;
pub use fixtures::{TestApp, TestFixtures};
pub use mock::{MockEntitlementChecker, MockIdentityProvider};
pub use requests::TestRequestBuilder;

/// Common test constants
pub mod constants {
    pub const TEST_CLIENT_ID: &str = "test-client-id";

    pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

    /// Session secret shared by every fixture
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-with-enough-entropy";

    pub const TEST_ORGANIZATION: &str = "acme";

    /// Prefix of every access token the mock provider issues
    pub const TEST_ACCESS_TOKEN: &str = "gho_test_access_token";

    pub const TEST_LOGIN: &str = "octocat";

    pub const TEST_PROVIDER_USER_ID: &str = "583231";
}
