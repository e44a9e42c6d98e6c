/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and a `.env` file in
/// development). Anything missing or malformed fails the process before it
/// binds a port.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Token signing secret, at least 32 bytes (required)
/// - `REQUEST_TIMEOUT_SECS`: Per-request storage deadline (default: 5)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: http://localhost)
/// - `PRODUCTION`: `true` enables HSTS (default: false)
/// - `RUST_LOG` / `LOG_FORMAT`: read by the logging setup in `main`
///
/// # Example
///
/// ```no_run
/// use roadmate_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::time::Duration;

/// Minimum signing secret length in bytes
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Complete application configuration
#[derive(Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Deadline for each request's storage work
    pub request_timeout: Duration,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,

    /// Enables production-only headers (HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HS256 secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from any key lookup
    ///
    /// `from_env` passes `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = get("API_HOST", "0.0.0.0");
        let port = get("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = get("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if secret.len() < MIN_JWT_SECRET_BYTES {
            anyhow::bail!(
                "JWT_SECRET must be at least {} bytes long",
                MIN_JWT_SECRET_BYTES
            );
        }

        let timeout_secs = get("REQUEST_TIMEOUT_SECS", "5")
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("REQUEST_TIMEOUT_SECS is invalid: {}", e))?;

        if timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let cors_origins = parse_origins(&get("CORS_ORIGINS", "http://localhost"));
        let production = matches!(
            get("PRODUCTION", "false").to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                request_timeout: Duration::from_secs(timeout_secs),
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Splits `CORS_ORIGINS`; `*` anywhere means any origin
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api", &self.api)
            .field("database", &"<redacted>")
            .field("jwt", &self.jwt)
            .finish()
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}
