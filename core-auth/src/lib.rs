//! # Authentication Module
//!
//! Establishes the bearer credential used for every request to the remote
//! instance and derives per-request headers from it.
//!
//! ## Overview
//!
//! An [`AuthSession`] is created once per configuration:
//! - a static token is adopted as-is and never expires
//! - an email/password pair is exchanged for a session token at startup, and
//!   the token is refreshed shortly before it expires
//! - without credentials the session is anonymous and requests carry no
//!   `Authorization` header
//!
//! Login failures are fatal and carry the underlying cause.

pub mod error;
pub mod session;
pub mod types;

pub use error::{AuthError, Result};
pub use session::AuthSession;
pub use types::AuthToken;
