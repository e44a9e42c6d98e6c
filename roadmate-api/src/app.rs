/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use roadmate_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = roadmate_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use roadmate_shared::auth::{jwt::TokenSigner, middleware::require_identity};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    middleware::security::SecurityHeadersLayer,
    routes,
};

/// Shared application state
///
/// Cloned into every handler through `State`; everything inside is either a
/// pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token codec keyed with the configured secret
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let signer = Arc::new(TokenSigner::new(config.jwt.secret.as_bytes()));

        Self {
            db,
            config: Arc::new(config),
            signer,
        }
    }

    /// Runs handler work under the configured request deadline
    ///
    /// When the deadline elapses the work future is dropped. Any transaction
    /// it held open is dropped with it and rolls back, so a timed-out write
    /// leaves nothing behind.
    pub async fn bounded<F, T>(&self, work: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match tokio::time::timeout(self.config.api.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout),
        }
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /                          # liveness
/// ├── GET  /health
/// ├── /auth/                          # public
/// │   ├── POST /signup
/// │   ├── POST /login
/// │   └── GET  /validUsername
/// └── /me/                            # bearer token required
///     ├── GET|PUT          /profile
///     ├── POST|PUT         /skills
///     ├── DELETE           /skills/:id
///     ├── POST|PUT         /educations
///     ├── DELETE           /educations/:id
///     ├── GET|POST|PUT     /projects
///     ├── DELETE           /projects/:id
///     ├── POST             /projects/:id/members
///     ├── DELETE           /projects/:id/members/:user_id
///     └── GET|POST         /projects/:id/tasks
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing. The gate sits
/// on the `/me` subtree only.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/validUsername", get(routes::auth::valid_username));

    let me_routes = Router::new()
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route(
            "/skills",
            post(routes::skills::create_skill).put(routes::skills::update_skill),
        )
        .route("/skills/:id", delete(routes::skills::delete_skill))
        .route(
            "/educations",
            post(routes::educations::create_education)
                .put(routes::educations::update_education),
        )
        .route("/educations/:id", delete(routes::educations::delete_education))
        .route(
            "/projects",
            get(routes::projects::list_projects)
                .post(routes::projects::create_project)
                .put(routes::projects::update_project),
        )
        .route("/projects/:id", delete(routes::projects::delete_project))
        .route("/projects/:id/members", post(routes::members::add_member))
        .route(
            "/projects/:id/members/:user_id",
            delete(routes::members::remove_member),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .layer(middleware::from_fn_with_state(
            state.signer.clone(),
            require_identity,
        ));

    let cors = cors_layer(&state.config.api.cors_origins);
    let production = state.config.api.production;

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/auth", auth_routes)
        .nest("/me", me_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Permissive when no origins are configured, otherwise an allow-list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
