use axum::{Router, routing::{get, post}, middleware};
use std::sync::Arc;

use crate::{auth_handlers, user_handlers, middleware as auth_middleware, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(|| async { "userdir API running" }))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/register", post(auth_handlers::register));

    // Protected user routes; mutating handlers also demand the admin role
    let user_routes = Router::new()
        .route(
            "/users",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .delete(user_handlers::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .with_state(state)
}
