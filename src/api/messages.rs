// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::{clean_session_id, decode_json, message_id};
use crate::{error::ApiError, models::Message, state::AppState};

#[utoipa::path(
    post,
    path = "/message/{session_id}",
    params(
        ("session_id" = String, Path, description = "Ceremony session identifier"),
        ("message_id" = Option<String>, Header, description = "Scopes the mailboxes to one keysign message")
    ),
    request_body = Message,
    tag = "Messages",
    responses(
        (status = 202, description = "Message queued for every recipient"),
        (status = 400, description = "Empty session ID or invalid JSON body")
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let session_id = clean_session_id(&session_id)?;
    let message: Message = decode_json(&body)?;

    if message.session_id.trim() != session_id {
        warn!(
            session_id = %session_id,
            body_session_id = %message.session_id,
            "Message body names a different session, using the path"
        );
    }

    state
        .mailboxes()
        .post(&session_id, message, message_id(&headers).as_deref())?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    get,
    path = "/message/{session_id}/{participant_key}",
    params(
        ("session_id" = String, Path, description = "Ceremony session identifier"),
        ("participant_key" = String, Path, description = "Recipient participant ID"),
        ("message_id" = Option<String>, Header, description = "Scopes the mailbox to one keysign message")
    ),
    tag = "Messages",
    responses(
        (status = 200, body = [Message]),
        (status = 404, description = "No message was ever addressed to this participant"),
        (status = 500, description = "Response could not be encoded")
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    Path((session_id, participant_key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let messages = state
        .mailboxes()
        .get(
            session_id.trim(),
            participant_key.trim(),
            message_id(&headers).as_deref(),
        )
        .await?;

    let body = serde_json::to_vec(&messages).map_err(|e| {
        error!(error = %e, "Failed to encode mailbox");
        ApiError::internal("failed to encode messages")
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Acknowledge a message so it is no longer returned to this participant.
#[utoipa::path(
    delete,
    path = "/message/{session_id}/{participant_key}/{hash}",
    params(
        ("session_id" = String, Path, description = "Ceremony session identifier"),
        ("participant_key" = String, Path, description = "Recipient participant ID"),
        ("hash" = String, Path, description = "Hash of the message to remove"),
        ("message_id" = Option<String>, Header, description = "Scopes the mailbox to one keysign message")
    ),
    tag = "Messages",
    responses((status = 200, description = "Message removed (or was already absent)"))
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path((session_id, participant_key, hash)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.mailboxes().acknowledge(
        session_id.trim(),
        participant_key.trim(),
        message_id(&headers).as_deref(),
        hash.trim(),
    )?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::HeaderValue};

    use crate::api::MESSAGE_ID_HEADER;

    fn message_body(to: &[&str], body: &str, hash: &str) -> Bytes {
        let message = Message {
            session_id: "S".into(),
            from: "alice".into(),
            to: to.iter().map(|s| s.to_string()).collect(),
            body: body.into(),
            hash: Some(hash.into()),
            sequence_no: None,
        };
        Bytes::from(serde_json::to_vec(&message).unwrap())
    }

    async fn read_mailbox(state: &AppState, recipient: &str, headers: HeaderMap) -> Vec<Message> {
        let response = get_messages(
            State(state.clone()),
            Path(("S".to_string(), recipient.to_string())),
            headers,
        )
        .await
        .expect("mailbox exists");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("application/json")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_fans_out_and_get_returns_fifo() {
        let state = AppState::default();

        let status = post_message(
            State(state.clone()),
            Path("S".into()),
            HeaderMap::new(),
            message_body(&["bob", "carol"], "M1", "h1"),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        post_message(
            State(state.clone()),
            Path("S".into()),
            HeaderMap::new(),
            message_body(&["bob"], "M2", "h2"),
        )
        .await
        .unwrap();

        let bob: Vec<_> = read_mailbox(&state, "bob", HeaderMap::new())
            .await
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bob, vec!["M1", "M2"]);

        let carol = read_mailbox(&state, "carol", HeaderMap::new()).await;
        assert_eq!(carol.len(), 1);
        assert_eq!(carol[0].body, "M1");
    }

    #[tokio::test]
    async fn unknown_mailbox_is_not_found() {
        let state = AppState::default();
        let err = get_messages(
            State(state),
            Path(("S".to_string(), "dave".to_string())),
            HeaderMap::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_rejects_bad_input() {
        let state = AppState::default();

        let err = post_message(
            State(state.clone()),
            Path(" ".into()),
            HeaderMap::new(),
            message_body(&["bob"], "x", "h"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = post_message(
            State(state),
            Path("S".into()),
            HeaderMap::new(),
            Bytes::from_static(br#"{"session_id":"S","from":"alice"}"#),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn message_id_header_scopes_post_get_and_delete() {
        let state = AppState::default();
        let mut scoped = HeaderMap::new();
        scoped.insert(MESSAGE_ID_HEADER, HeaderValue::from_static("tx-1"));

        post_message(
            State(state.clone()),
            Path("S".into()),
            scoped.clone(),
            message_body(&["bob"], "scoped", "h1"),
        )
        .await
        .unwrap();

        assert!(get_messages(
            State(state.clone()),
            Path(("S".to_string(), "bob".to_string())),
            HeaderMap::new(),
        )
        .await
        .is_err());
        assert_eq!(read_mailbox(&state, "bob", scoped.clone()).await.len(), 1);

        let status = delete_message(
            State(state.clone()),
            Path(("S".to_string(), "bob".to_string(), "h1".to_string())),
            scoped.clone(),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);

        let err = get_messages(
            State(state),
            Path(("S".to_string(), "bob".to_string())),
            scoped,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
