pub(crate) mod auth;
pub(crate) mod authorizer;
pub(crate) mod health;
pub(crate) mod invoke;

use crate::state::AppState;
use axum::{routing::post, Router};

/// Combines all API routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/auth", post(auth::auth_handler))
        .route("/authorize", post(authorizer::authorize_handler))
        .route("/invoke", post(invoke::invoke_handler))
}
