// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderMap,
    routing::{delete, get, post},
    Router,
};
use serde::de::DeserializeOwned;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{error::ApiError, models::Message, state::AppState, storage::CacheStats};

pub mod health;
pub mod messages;
pub mod sessions;

/// Request header scoping a mailbox to one keysign message.
pub const MESSAGE_ID_HEADER: &str = "message_id";

pub fn router(state: AppState) -> Router {
    let relay_routes = Router::new()
        .route("/", post(sessions::missing_session_id))
        .route("/start/", post(sessions::missing_session_id))
        .route("/message/", post(sessions::missing_session_id))
        .route("/health", get(health::health))
        .route(
            "/{session_id}",
            get(sessions::get_session)
                .post(sessions::join_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/start/{session_id}",
            get(sessions::get_start).post(sessions::start_session),
        )
        .route("/message/{session_id}", post(messages::post_message))
        .route(
            "/message/{session_id}/{participant_key}",
            get(messages::get_messages),
        )
        .route(
            "/message/{session_id}/{participant_key}/{hash}",
            delete(messages::delete_message),
        )
        .with_state(state);

    Router::new()
        .merge(relay_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// First path segments of the relay's own routes. A single-segment request
/// with one of these names is not a session.
pub const RESERVED_SESSION_IDS: [&str; 5] = ["health", "docs", "api-doc", "start", "message"];

/// Trim a session ID path segment; an empty result is a client error.
pub(crate) fn clean_session_id(raw: &str) -> Result<String, ApiError> {
    let session_id = raw.trim();
    if session_id.is_empty() {
        warn!("Request session id is empty");
        return Err(ApiError::bad_request("session id is empty"));
    }
    Ok(session_id.to_string())
}

/// Like [`clean_session_id`], but also refuses the relay's route names.
pub(crate) fn new_session_id(raw: &str) -> Result<String, ApiError> {
    let session_id = clean_session_id(raw)?;
    if RESERVED_SESSION_IDS.contains(&session_id.as_str()) {
        warn!(session_id = %session_id, "Request session id is reserved");
        return Err(ApiError::bad_request("session id is reserved"));
    }
    Ok(session_id)
}

/// Decode a JSON request body regardless of its declared content type.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Failed to decode JSON body");
        ApiError::bad_request("invalid json payload")
    })
}

pub(crate) fn message_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MESSAGE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::join_session,
        sessions::get_session,
        sessions::delete_session,
        sessions::start_session,
        sessions::get_start,
        messages::post_message,
        messages::get_messages,
        messages::delete_message,
        health::health
    ),
    components(schemas(Message, CacheStats, health::HealthResponse)),
    tags(
        (name = "Sessions", description = "Participant discovery and committee announcement"),
        (name = "Messages", description = "Per-recipient mailboxes for ceremony messages"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;
