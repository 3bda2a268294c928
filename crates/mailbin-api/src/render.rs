//! Message rendering and inline content rewriting.
//!
//! The rewriter makes a stored HTML body renderable in a browser by
//! replacing `cid:` content-identifier references with part-fetch URLs.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use mailbin_core::Message;
use regex::Regex;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `GET /view/{id}.html` and `GET /view/{id}.txt`.
///
/// The ID may be the literal `latest`, resolving to the most recently
/// received message.
pub(crate) async fn view_message(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    if let Some(id) = name.strip_suffix(".html") {
        render_html(&state, id).await
    } else if let Some(id) = name.strip_suffix(".txt") {
        render_text(&state, id).await
    } else {
        Err(ApiError::NotFound("Message not found".to_string()))
    }
}

/// Resolve the `latest` pseudo-ID via a one-item listing.
async fn resolve_id(state: &AppState, id: &str) -> ApiResult<String> {
    if id != "latest" {
        return Ok(id.to_string());
    }

    let messages = state.store.list(0, 1).await?;
    messages
        .first()
        .map(|message| message.id.clone())
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
}

async fn render_html(state: &AppState, id: &str) -> ApiResult<Response> {
    let id = resolve_id(state, id).await?;
    let message = state.store.get_message(&id).await?;

    if message.html.is_empty() {
        return Err(ApiError::NotFound(
            "This message does not contain an HTML part".to_string(),
        ));
    }

    let html = rewrite_inline_links(&message, &state.webroot);
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
}

async fn render_text(state: &AppState, id: &str) -> ApiResult<Response> {
    let id = resolve_id(state, id).await?;
    let message = state.store.get_message(&id).await?;

    // An empty text body is a valid response, not an error.
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message.text,
    )
        .into_response())
}

/// Replace `cid:` references in the message's HTML body with part-fetch
/// URLs under `webroot`.
///
/// Only attribute-value contexts are rewritten: an assignment opener
/// (`=` with an optional quote), the literal `cid:` reference, and a
/// closing quote, whitespace, `/`, `>`, or `;`. Bare textual mentions of
/// a content identifier are left alone. The transformation is idempotent
/// because the substituted URLs never match the `cid:` pattern.
#[must_use]
pub fn rewrite_inline_links(message: &Message, webroot: &str) -> String {
    let mut html = message.html.clone();

    for part in message.inline.iter().chain(message.attachments.iter()) {
        if part.content_id.is_empty() {
            continue;
        }
        let url = format!(
            "{webroot}api/v1/message/{}/part/{}",
            message.id, part.part_id
        );
        html = rewrite_cid(&html, &part.content_id, &url);
    }

    html
}

fn rewrite_cid(html: &str, content_id: &str, url: &str) -> String {
    // Content identifiers are matched as literal text, never as pattern
    // syntax.
    let pattern = format!(
        r#"(?i)(=["']?)cid:{}(["'\s/>;])"#,
        regex::escape(content_id)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return html.to_string();
    };

    re.replace_all(html, |caps: &regex::Captures<'_>| {
        format!("{}{}{}", &caps[1], url, &caps[2])
    })
    .into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mailbin_core::Attachment;
    use proptest::prelude::*;

    fn message_with_html(html: &str, parts: Vec<(&str, &str, bool)>) -> Message {
        let mut inline = Vec::new();
        let mut attachments = Vec::new();
        for (part_id, content_id, is_inline) in parts {
            let part = Attachment {
                part_id: part_id.to_string(),
                content_id: content_id.to_string(),
                content_type: "image/png".to_string(),
                file_name: String::new(),
                size: 0,
                content: Vec::new(),
            };
            if is_inline {
                inline.push(part);
            } else {
                attachments.push(part);
            }
        }

        Message {
            id: "msg1".to_string(),
            read: false,
            from: None,
            to: Vec::new(),
            subject: String::new(),
            created: Utc::now(),
            size: 0,
            text: String::new(),
            html: html.to_string(),
            inline,
            attachments,
        }
    }

    #[test]
    fn rewrites_attribute_references_only() {
        let msg = message_with_html(
            r#"<img src="cid:logo"> see cid:logo for details"#,
            vec![("2", "logo", true)],
        );
        let html = rewrite_inline_links(&msg, "/");
        assert_eq!(
            html,
            r#"<img src="/api/v1/message/msg1/part/2"> see cid:logo for details"#
        );
    }

    #[test]
    fn rewrites_single_quotes_and_unquoted() {
        let msg = message_with_html(
            "<img src='cid:logo'><embed src=cid:logo>",
            vec![("2", "logo", true)],
        );
        let html = rewrite_inline_links(&msg, "/");
        assert_eq!(
            html,
            "<img src='/api/v1/message/msg1/part/2'><embed src=/api/v1/message/msg1/part/2>"
        );
    }

    #[test]
    fn matches_case_insensitively() {
        let msg = message_with_html(r#"<img src="CID:Logo">"#, vec![("2", "Logo", true)]);
        let html = rewrite_inline_links(&msg, "/");
        assert_eq!(html, r#"<img src="/api/v1/message/msg1/part/2">"#);
    }

    #[test]
    fn content_id_is_matched_literally() {
        // Regex metacharacters in the content identifier are exact text.
        let msg = message_with_html(
            r#"<img src="cid:logo(1)+x"><img src="cid:logoa1bx">"#,
            vec![("2", "logo(1)+x", true)],
        );
        let html = rewrite_inline_links(&msg, "/");
        assert_eq!(
            html,
            r#"<img src="/api/v1/message/msg1/part/2"><img src="cid:logoa1bx">"#
        );
    }

    #[test]
    fn attachment_parts_are_rewritten_after_inline() {
        let msg = message_with_html(
            r#"<img src="cid:logo"><a href="cid:file">x</a>"#,
            vec![("2", "logo", true), ("3", "file", false)],
        );
        let html = rewrite_inline_links(&msg, "/mail/");
        assert_eq!(
            html,
            r#"<img src="/mail/api/v1/message/msg1/part/2"><a href="/mail/api/v1/message/msg1/part/3">x</a>"#
        );
    }

    #[test]
    fn untouched_without_content_id() {
        let msg = message_with_html(r#"<img src="cid:logo">"#, vec![("2", "", true)]);
        let html = rewrite_inline_links(&msg, "/");
        assert_eq!(html, r#"<img src="cid:logo">"#);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let msg = message_with_html(
            r#"<img src="cid:logo"><img src='cid:logo'/>"#,
            vec![("2", "logo", true)],
        );
        let once = rewrite_inline_links(&msg, "/");

        let mut again = msg.clone();
        again.html.clone_from(&once);
        let twice = rewrite_inline_links(&again, "/");

        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn rewrite_idempotent_for_arbitrary_cids(cid in "[A-Za-z0-9._@-]{1,24}") {
            let html = format!(r#"<img src="cid:{cid}"> and text cid:{cid} here"#);
            let msg = message_with_html(&html, vec![("2", cid.as_str(), true)]);

            let once = rewrite_inline_links(&msg, "/");
            let mut again = msg.clone();
            again.html.clone_from(&once);
            let twice = rewrite_inline_links(&again, "/");

            prop_assert_eq!(once, twice);
        }
    }
}
