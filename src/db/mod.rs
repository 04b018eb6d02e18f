//! Database module for the tokengate server
//!
//! This module owns the user record model and the repository
//! abstraction the auth layer reads and writes users through.

pub mod models;
pub mod repository;

pub use models::User;
pub use repository::{MemoryUserRepository, PgUserRepository, UserRepository};
