//! API router.
//!
//! Routes are nested under `/api/`; stored scans and heatmaps are
//! served read-only under `/uploads/`. Everything except login sits
//! behind the session-token middleware.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::state::AppState;

/// Largest accepted upload body. OCT exports run a few megabytes;
/// anything near this bound is not a scan.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the API router for the given application state.
pub fn api_router(core: Arc<AppState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

/// Build router from a pre-constructed `ApiContext`.
/// Used by tests that need direct access to the shared context.
pub(crate) fn build_router(ctx: ApiContext) -> Router {
    // Protected routes: session auth via middleware. Extension must be
    // outermost so the middleware can extract ApiContext.
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/diagnoses", post(endpoints::diagnose::upload))
        .route("/results", get(endpoints::results::results))
        .route("/report", get(endpoints::results::report))
        .route("/history", get(endpoints::history::list))
        .route("/reports/:id", get(endpoints::report::download))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Login is the only unauthenticated route.
    let unprotected = Router::new()
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone());

    let uploads = ServeDir::new(ctx.core.uploads.root());

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}
