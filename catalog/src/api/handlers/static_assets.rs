//! HTTP handlers for static asset serving.

use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::errors::Error;
use crate::static_assets;

/// Serve the embedded admin page and its scripts and stylesheets.
///
/// `/` and any path ending in `/` map to `index.html`. Unknown paths are a JSON 404.
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> Response {
    let mut path = uri.path().trim_start_matches('/');

    if path.is_empty() || path.ends_with('/') {
        path = "index.html";
    }

    let Some(content) = static_assets::Assets::get(path) else {
        return Error::NotFound {
            resource: "Resource".to_string(),
            id: uri.path().to_string(),
        }
        .into_response();
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from(content.data.into_owned()),
    )
        .into_response()
}
