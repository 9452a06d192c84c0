//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Validators decide whether an action is allowed; services perform
//! reads and writes against the database after consulting them.

mod feed;
mod page;
mod post;
mod user;
pub mod validators;

pub use feed::{FeedMode, FeedService};
pub use page::{Page, PageRequest};
pub use post::{PostService, PostView};
pub use user::{UserProfile, UserService};
