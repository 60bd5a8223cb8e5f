//! Data models exchanged with the auth service.
//!
//! - `User`: the identity record owned by the server
//! - `Session`: tokens plus the user, replaced wholesale on every sign-in

pub mod session;
pub mod user;

pub use session::{Session, DEFAULT_MAX_AGE_SECS};
pub use user::User;
