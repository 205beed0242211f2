//! # FamSync Shared Library
//!
//! This crate contains shared types and business logic used by the FamSync
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data-access operations
//! - `auth`: Password hashing, access tokens, and authorization guards
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the FamSync shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
