//! Google Calendar sink for daycount.
//!
//! Holds the OAuth lifecycle (`session`, `authenticate`) and turns an
//! [`daycount_core::EventSpec`] into an inserted Google Calendar event.

pub mod app_config;
pub mod authenticate;
pub mod google_event;
pub mod insert;
pub mod session;

pub use google_event::ToGoogle;
pub use insert::{DEFAULT_CALENDAR_ID, InsertedEvent, insert_event};
pub use session::{AuthContext, Authorizer, GoogleAuthorizer, SessionData, SessionStore};
