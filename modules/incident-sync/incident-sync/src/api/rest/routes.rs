use std::sync::Arc;

use axum::Router;
use axum::extract::Extension;
use axum::routing::any;
use incident_sync_sdk::IncidentSyncApi;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::{cors, handlers};

fn apply_trace_layer(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<axum::body::Body>| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri().path(),
            )
        }),
    )
}

/// Build the incident gateway router.
///
/// Layer order, outermost first: CORS headers, trace, panic recovery, routes.
pub fn router(api: Arc<dyn IncidentSyncApi>) -> Router {
    let router = Router::new()
        .route("/incidents", any(handlers::handle_collection))
        .route("/incidents/{id}", any(handlers::handle_item))
        .fallback(handlers::route_not_found)
        .layer(Extension(api))
        .layer(CatchPanicLayer::custom(handlers::panic_response));

    cors::apply_cors(apply_trace_layer(router))
}
