use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::KeeperConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::identity::Identity;
use crate::middleware::jwt_auth_middleware;
use crate::services::KeeperService;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Token verification settings for the application this service serves
#[derive(Clone)]
pub struct AuthSettings {
    pub app_id: i32,
    pub app_secret: Arc<str>,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub keeper: KeeperService,
    pub identity: Arc<dyn Identity>,
    pub auth: AuthSettings,
    /// Pinged by `/health` when present
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub fn new(keeper: KeeperService, identity: Arc<dyn Identity>, app_id: i32, app_secret: &str) -> Self {
        Self {
            keeper,
            identity,
            auth: AuthSettings {
                app_id,
                app_secret: Arc::from(app_secret),
            },
            database: None,
        }
    }

    pub fn with_database(mut self, database: DatabaseManager) -> Self {
        self.database = Some(database);
        self
    }
}

/// Router-level settings taken from [`KeeperConfig`]
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub request_timeout: Duration,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            cors_origins: Vec::new(),
        }
    }
}

impl From<&KeeperConfig> for RouterOptions {
    fn from(config: &KeeperConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.http_server.timeout_secs),
            cors_origins: config.cors_origins.clone(),
        }
    }
}

pub fn router(state: AppState, options: &RouterOptions) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/auth/register", post(public::register))
        .route("/api/auth/login", post(public::login))
        .route("/api/keeper/users", get(public::users_get))
        .route("/api/keeper/categories", get(public::categories_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/keeper/profile", get(protected::profile_get))
        .route("/api/keeper/user", put(protected::user_put))
        .route("/api/keeper/collections", get(protected::collections_get))
        .route(
            "/api/keeper/collection",
            post(protected::collection_post).put(protected::collection_put),
        )
        .route(
            "/api/keeper/collection/:id",
            get(protected::collection_get).delete(protected::collection_delete),
        )
        .route("/api/keeper/collection/:id/items", get(protected::collection_items_get))
        .route("/api/keeper/item", post(protected::item_post))
        .route(
            "/api/keeper/item/:id",
            get(protected::item_get)
                .put(protected::item_put)
                .delete(protected::item_delete),
        )
        .route("/api/keeper/category", post(protected::category_post))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::AUTHORIZATION])
}
