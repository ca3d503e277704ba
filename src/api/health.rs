// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::CacheStats;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// When this process started. All relay state is lost on restart.
    pub started_at: DateTime<Utc>,
    /// Shared cache occupancy. Absent when the cache is not responding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

/// Health check endpoint handler.
///
/// Returns 200 while the cache actor answers, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = state.cache.stats().await.ok();
    let (status, label) = match cache {
        Some(_) => (StatusCode::OK, "ok"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    let response = HealthResponse {
        status: label.to_string(),
        started_at: state.started_at,
        cache,
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_cache_occupancy() {
        let state = AppState::default();
        state
            .sessions()
            .join("S", vec!["alice".to_string()])
            .unwrap();

        let (status, Json(body)) = health(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.started_at, state.started_at);

        let cache = body.cache.expect("cache stats present");
        assert_eq!(cache.entries, 1);
        assert_eq!(cache.capacity, state.config.cache_capacity);
        assert_eq!(cache.evictions, 0);
    }
}
