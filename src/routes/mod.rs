pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::get,
};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::error;

use crate::AppState;
use crate::constants::{LOCAL_MEDIA_PREFIX, MAX_IMAGE_UPLOAD_SIZE, MULTIPART_OVERHEAD};
use crate::services::error::ApiError;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(upload::routes())
}

/// Full application: API routes, local media (if any), static site fallback and
/// the layers every request goes through.
pub fn build_app(state: Arc<AppState>, static_dir: &Path, media_dir: Option<&Path>) -> Router {
    let mut router = build_routes();

    if let Some(media_dir) = media_dir {
        router = router.nest_service(LOCAL_MEDIA_PREFIX, ServeDir::new(media_dir));
    }

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    router
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_SIZE + MULTIPART_OVERHEAD))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };

    error!("General server error: {}", message);
    ApiError::Unexpected(message).into_response()
}
