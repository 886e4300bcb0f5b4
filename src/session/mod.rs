//! Session management
//!
//! - [`manager`] - attach, read and destroy browser sessions
//! - [`cookie`] - signed session cookie and sealed login state cookie
//! - [`store`] - concurrent in-memory session records

pub mod cookie;
pub mod manager;
pub mod store;

pub use cookie::{CookieFactory, CookieOptions, COOKIE_NAME, OAUTH_STATE_COOKIE};
pub use manager::{SessionError, SessionManager};
pub use store::SessionStore;
