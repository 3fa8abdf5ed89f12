// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, auth, categories, posts},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public reads and protected writes for posts, comments and categories.
/// * Authentication runs as a layer before any protected handler, so
///   unauthenticated requests never reach body parsing or validation.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .route_layer(require_auth.clone()),
        );

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/{id}", get(posts::get_post))
        // Protected post routes
        .merge(
            Router::new()
                .route("/", post(posts::create_post))
                .route(
                    "/{id}",
                    put(posts::update_post).delete(posts::delete_post),
                )
                .route("/{id}/comments", post(posts::add_comment))
                .route_layer(require_auth.clone()),
        );

    let category_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/{id}", get(categories::get_category))
        .merge(
            Router::new()
                .route("/", post(categories::create_category))
                .route_layer(require_auth),
        );

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/categories", category_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
