//! Attachment part and raw-source download handlers.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct RawParams {
    dl: Option<String>,
}

/// `GET /api/v1/message/{id}/part/{part_id}`: one part's raw bytes.
///
/// The display filename falls back to the part's Content-ID when the
/// stored filename is empty.
pub(crate) async fn download_part(
    State(state): State<AppState>,
    Path((id, part_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let part = state.store.get_attachment_part(&id, &part_id).await?;

    let file_name = if part.file_name.is_empty() {
        part.content_id.clone()
    } else {
        part.file_name.clone()
    };
    let content_type = if part.content_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        part.content_type.clone()
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("filename=\"{}\"", sanitize_filename(&file_name)),
        )
        .body(Body::from(part.content))
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// `GET /api/v1/message/{id}/raw?dl=1`: unparsed original source.
///
/// `dl` equal to exactly `1` marks the response as a download named
/// `{id}.eml`; otherwise it renders inline.
pub(crate) async fn download_raw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RawParams>,
) -> ApiResult<Response> {
    let raw = state.store.get_raw(&id).await?;

    let mut builder = Response::builder().header(header::CONTENT_TYPE, "text/plain");
    if params.dl.as_deref() == Some("1") {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.eml\"", sanitize_filename(&id)),
        );
    }

    builder
        .body(Body::from(raw))
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Make a filename safe for insertion into a quoted header value.
///
/// Control characters are removed; quote and backslash characters are
/// replaced so the value cannot terminate the quoted string early.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect()
}
