//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::images::{list_images, resolve_public_path};
use crate::state::AppState;

/// `GET /`
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let path = state.config.templates_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read index template");
            (StatusCode::INTERNAL_SERVER_ERROR, "index.html not available").into_response()
        }
    }
}

/// `GET /images`
pub async fn images_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let listing = list_images(&state.config.public_dir, &state.config.categories).await;
    Json(listing)
}

/// `GET /public/*path`
pub async fn public_file_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
) -> Response {
    let Some(file) = resolve_public_path(&state.config.public_dir, &path).await else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match tokio::fs::read(&file).await {
        Ok(body) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Failed to read public file");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}
