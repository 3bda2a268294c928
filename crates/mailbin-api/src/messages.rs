//! Listing, search, retrieval, and bulk mutation handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use mailbin_core::{Event, Message, MessageSummary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Page size used when the request does not specify a limit.
const DEFAULT_LIMIT: i64 = 50;

/// Response envelope for listings and search results.
///
/// `total` and `unread` are store-wide aggregates, not page-scoped;
/// they are re-fetched on every call so they reflect the latest mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesPage {
    /// Total number of stored messages.
    pub total: i64,
    /// Number of unread messages.
    pub unread: i64,
    /// Number of items in this page.
    pub count: usize,
    /// Requested offset.
    pub start: i64,
    /// Message summaries, newest first.
    pub items: Vec<MessageSummary>,
}

/// Raw pagination parameters.
///
/// Kept as strings so non-numeric values fall back to the defaults
/// instead of failing extraction.
#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    start: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdListRequest {
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadStatusRequest {
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default = "default_read")]
    read: bool,
}

fn default_read() -> bool {
    true
}

/// `GET /api/v1/mailboxes`: aggregate statistics.
pub(crate) async fn mailbox_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<mailbin_core::MailboxStats>> {
    Ok(Json(state.store.stats().await?))
}

/// `GET /api/v1/messages`: paginated listing, newest first.
pub(crate) async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<MessagesPage>> {
    let start = parse_param(params.start.as_deref())
        .filter(|start| *start >= 0)
        .unwrap_or(0);
    let limit = parse_param(params.limit.as_deref())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT);

    let items = state.store.list(start, limit).await?;
    let stats = state.store.stats().await?;

    Ok(Json(MessagesPage {
        total: stats.total,
        unread: stats.unread,
        count: items.len(),
        start,
        items,
    }))
}

/// `GET /api/v1/search?query=`: free-text search over all messages.
///
/// An empty or whitespace-only query reports not-found.
pub(crate) async fn search_messages(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<MessagesPage>> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::NotFound("Not found".to_string()));
    }

    let items = state.store.search(query).await?;
    let stats = state.store.stats().await?;

    Ok(Json(MessagesPage {
        total: stats.total,
        unread: stats.unread,
        count: items.len(),
        start: 0,
        items,
    }))
}

/// `GET /api/v1/message/{id}`: full message, including bodies and parts.
pub(crate) async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.store.get_message(&id).await?))
}

/// `DELETE /api/v1/messages`: delete everything, or the listed messages.
///
/// An empty body deletes all messages; otherwise the body must decode as
/// `{"ids": [...]}` and the listed IDs are deleted in order, stopping at
/// the first store error. Deletions applied before the error remain
/// applied.
pub(crate) async fn delete_messages(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<&'static str> {
    if is_empty_body(&body) {
        state.store.delete_all().await?;
        state.broker.publish(Event::Truncated);
        return Ok("ok");
    }

    let request: IdListRequest = decode_body(&body)?;

    let mut deleted = Vec::new();
    let mut failure = None;
    for id in &request.ids {
        match state.store.delete_one(id).await {
            Ok(()) => deleted.push(id.clone()),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    if !deleted.is_empty() {
        state.broker.publish(Event::Deleted { ids: deleted });
    }
    if let Some(err) = failure {
        return Err(err.into());
    }

    Ok("ok")
}

/// `DELETE /api/v1/messages/{id}`: delete a single message.
pub(crate) async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    state.store.delete_one(&id).await?;
    state.broker.publish(Event::Deleted { ids: vec![id] });
    Ok("ok")
}

/// `PUT /api/v1/messages`: mark all read, or toggle the listed messages.
///
/// An empty body marks every message read. Otherwise the body must decode
/// as `{"ids": [...], "read": bool}` (`read` defaults to `true`); the
/// listed IDs are mutated in order, stopping at the first store error,
/// and earlier mutations remain applied.
pub(crate) async fn set_read_status(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<&'static str> {
    if is_empty_body(&body) {
        state.store.mark_all_read().await?;
        state.broker.publish(Event::AllRead);
        return Ok("ok");
    }

    let request: ReadStatusRequest = decode_body(&body)?;

    if request.ids.is_empty() {
        if !request.read {
            return Err(ApiError::BadRequest(
                "no message ids provided".to_string(),
            ));
        }
        state.store.mark_all_read().await?;
        state.broker.publish(Event::AllRead);
        return Ok("ok");
    }

    let mut mutated = Vec::new();
    let mut failure = None;
    for id in &request.ids {
        let result = if request.read {
            state.store.mark_read(id).await
        } else {
            state.store.mark_unread(id).await
        };
        match result {
            Ok(()) => mutated.push(id.clone()),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    if !mutated.is_empty() {
        state.broker.publish(Event::ReadStatus {
            ids: mutated,
            read: request.read,
        });
    }
    if let Some(err) = failure {
        return Err(err.into());
    }

    Ok("ok")
}

/// `PUT /api/v1/messages/{id}`: mark a single message unread.
pub(crate) async fn unread_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    state.store.mark_unread(&id).await?;
    state.broker.publish(Event::ReadStatus {
        ids: vec![id],
        read: false,
    });
    Ok("ok")
}

/// Parse a numeric query parameter, treating unparseable values as absent.
fn parse_param(value: Option<&str>) -> Option<i64> {
    value.and_then(|value| value.parse().ok())
}

fn is_empty_body(body: &Bytes) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn decode_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
}
