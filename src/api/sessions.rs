// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use super::{clean_session_id, decode_json, new_session_id};
use crate::{error::ApiError, state::AppState};

/// `POST /`, `POST /start/` and `POST /message/` carry no session ID at all.
pub async fn missing_session_id() -> ApiError {
    warn!("Request session id is empty");
    ApiError::bad_request("session id is empty")
}

#[utoipa::path(
    post,
    path = "/{session_id}",
    params(("session_id" = String, Path, description = "Ceremony session identifier")),
    request_body = Vec<String>,
    tag = "Sessions",
    responses(
        (status = 201, description = "Participants registered"),
        (status = 400, description = "Empty or reserved session ID, or invalid JSON body")
    )
)]
pub async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let session_id = new_session_id(&session_id)?;
    let participants: Vec<String> = decode_json(&body)?;
    state.sessions().join(&session_id, participants)?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/{session_id}",
    params(("session_id" = String, Path, description = "Ceremony session identifier")),
    tag = "Sessions",
    responses(
        (status = 200, body = [String]),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let participants = state.sessions().get(session_id.trim()).await?;
    Ok(Json(participants))
}

/// Removes the session, its start record and every mailbox in it.
#[utoipa::path(
    delete,
    path = "/{session_id}",
    params(("session_id" = String, Path, description = "Ceremony session identifier")),
    tag = "Sessions",
    responses((status = 200, description = "Session removed (or was already absent)"))
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = session_id.trim();
    if !session_id.is_empty() {
        state.sessions().delete(session_id)?;
        state.mailboxes().purge_session(session_id)?;
    }
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/start/{session_id}",
    params(("session_id" = String, Path, description = "Ceremony session identifier")),
    request_body = Vec<String>,
    tag = "Sessions",
    responses(
        (status = 200, description = "Committee recorded"),
        (status = 400, description = "Empty session ID or invalid JSON body")
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let session_id = clean_session_id(&session_id)?;
    let committee: Vec<String> = decode_json(&body)?;
    state.sessions().start(&session_id, committee)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/start/{session_id}",
    params(("session_id" = String, Path, description = "Ceremony session identifier")),
    tag = "Sessions",
    responses(
        (status = 200, body = [String]),
        (status = 404, description = "Session has not started")
    )
)]
pub async fn get_start(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let committee = state.sessions().started(session_id.trim()).await?;
    Ok(Json(committee))
}
