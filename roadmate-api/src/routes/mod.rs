/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database health
/// - `auth`: signup, login, username availability
/// - `profile`, `skills`, `educations`: the caller's own profile rows
/// - `projects`, `members`, `tasks`: project-scoped resources

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod educations;
pub mod health;
pub mod members;
pub mod profile;
pub mod projects;
pub mod skills;
pub mod tasks;

/// Acknowledgement body for deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}
