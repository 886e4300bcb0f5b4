// HTTP request handlers for the follower gate
pub mod auth;
pub mod callback;
pub mod gate;
pub mod pages;

#[cfg(test)]
mod tests;

pub use auth::{logout, start_login};
pub use callback::oauth_callback;
pub use gate::{AuthenticatedSession, GateRejection};
pub use pages::{health, index, not_follow, private_view};
