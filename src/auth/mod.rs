//! Authentication against connection authorization servers
//!
//! # Module Layout
//!
//! - [`session`]    -- password and refresh-token grants, token persistence
//! - [`dispatcher`] -- authenticated request dispatch with fallback cascade

pub mod dispatcher;
pub mod session;

pub use dispatcher::RequestDispatcher;
pub use session::{AuthParams, AuthSession, AuthToken};
