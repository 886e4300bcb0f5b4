#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the followgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod entitlement;
pub mod error;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod session;
pub mod settings;
pub mod utils;
pub mod verifier;
pub mod views;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use entitlement::{EntitlementChecker, FollowChecker};
pub use error::{ConfigError, RejectionReason};
pub use oauth::{IdentityProvider, ProviderClient};
pub use routes::configure_services;
pub use session::SessionManager;
pub use settings::GateSettings;
pub use verifier::IdentityVerifier;
pub use views::ViewRenderer;
