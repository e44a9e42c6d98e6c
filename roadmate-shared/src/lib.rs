//! # Roadmate Shared Library
//!
//! Core of the Roadmate API: who is calling, what they may touch, and how
//! task columns stay ordered.
//!
//! ## Module Organization
//!
//! - `auth`: Credential codec, password hashing, authorization gate, membership checks
//! - `rank`: Rank maintenance for ordered task columns
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod rank;

/// Current version of the Roadmate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
