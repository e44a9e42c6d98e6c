//! # Roadmate API Server Library
//!
//! HTTP surface for accounts, profiles, projects and their task boards.
//!
//! ## Modules
//!
//! - `app`: Application state, request deadline and router builder
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
