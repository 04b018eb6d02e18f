//! Authentication module for the tokengate server
//!
//! This module handles credential verification, token issuance and
//! validation, and refresh-token session tracking.

pub mod handlers;
pub mod password;
pub mod session;
pub mod token;

mod service;

pub use service::{SessionManager, TokenPair};
pub use session::{MemorySessionStore, PgSessionStore, SessionStore};
pub use token::{TokenCodec, TokenError, TokenPayload};
