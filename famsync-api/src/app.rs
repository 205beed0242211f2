/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use famsync_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = famsync_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use famsync_shared::auth::{
    jwt,
    middleware::{bearer_token, AuthContext, AuthError},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets the signing secret for token operations
    pub fn secret_key(&self) -> &str {
        &self.config.auth.secret_key
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /api/v1/
///     ├── /auth/                       # Session lifecycle
///     │   ├── POST /register           # (public)
///     │   ├── POST /login              # (public)
///     │   ├── POST /refresh            # (public, cookie-authenticated)
///     │   ├── POST /logout             # (public, idempotent)
///     │   └── GET  /session-check      # (bearer-validated inline)
///     ├── /users/me                    # Profile (authenticated)
///     ├── /families                    # Family CRUD + members (authenticated)
///     ├── /tasks                       # Task CRUD, roots, subtasks (authenticated)
///     ├── /tags                        # Tag CRUD (authenticated)
///     └── /admin                       # Maintenance triggers (authenticated)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Bearer authentication (per-route-group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes: the session lifecycle authenticates itself (password,
    // refresh cookie, or inline bearer check), not via the middleware layer
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        .route("/session-check", get(routes::auth::session_check));

    let user_routes = Router::new()
        .route("/me", get(routes::users::read_me))
        .route("/me", put(routes::users::update_me));

    let family_routes = Router::new()
        .route("/", post(routes::families::create_family))
        .route("/", get(routes::families::list_families))
        .route("/:family_id", get(routes::families::read_family))
        .route("/:family_id", put(routes::families::update_family))
        .route("/:family_id/members", post(routes::families::add_member))
        .route("/:family_id/members", get(routes::families::list_members))
        .route(
            "/:family_id/members/:user_id",
            delete(routes::families::remove_member),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/roots", get(routes::tasks::list_root_tasks))
        .route("/with-subtasks/:task_id", get(routes::tasks::read_task_with_subtasks))
        .route("/:task_id", get(routes::tasks::read_task))
        .route("/:task_id", put(routes::tasks::update_task))
        .route("/:task_id", delete(routes::tasks::delete_task))
        .route("/:task_id/subtasks", post(routes::tasks::create_subtask))
        .route(
            "/:task_id/bulk-subtasks",
            post(routes::tasks::create_bulk_subtasks),
        );

    let tag_routes = Router::new()
        .route("/", post(routes::tags::create_tag))
        .route("/family/:family_id", get(routes::tags::list_family_tags))
        .route("/:tag_id", put(routes::tags::update_tag))
        .route("/:tag_id", delete(routes::tags::delete_tag));

    let admin_routes = Router::new().route(
        "/reset-routine-tasks",
        post(routes::admin::reset_routine_tasks),
    );

    // Everything except the session lifecycle requires a bearer token
    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/families", family_routes)
        .nest("/tasks", task_routes)
        .nest("/tags", tag_routes)
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
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
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication middleware layer
///
/// Extracts and validates the access token from the Authorization header,
/// then injects an [`AuthContext`] into request extensions. Expired and
/// forged tokens produce the same response.
async fn bearer_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.secret_key()).map_err(|e| {
        tracing::debug!("Access token rejected: {}", e);
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthContext::new(claims.sub));

    Ok(next.run(req).await)
}
