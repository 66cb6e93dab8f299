//! Web backend for the rendered GFS maps.
//!
//! Three routes over a directory tree written by the pipeline:
//!
//! - `GET /` returns `index.html` from the templates directory
//! - `GET /images` lists image files per category folder as JSON
//! - `GET /public/*path` serves a file from the public directory

pub mod handlers;
pub mod images;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use images::{list_images, resolve_public_path, ImageListing};
pub use state::{AppState, WebConfig};

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/images", get(handlers::images_handler))
        .route("/public/*path", get(handlers::public_file_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
