/// Middleware modules for the API server
///
/// - `security`: Security response headers
///
/// The authorization gate lives in `roadmate_shared::auth::middleware`.

pub mod security;
