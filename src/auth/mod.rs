//! Requester identity
//!
//! Handles:
//! - Signed session tokens carrying a user id
//! - Extractors resolving the acting user for handlers

mod middleware;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser};
pub use session::{Session, create_session_token, verify_session_token};
