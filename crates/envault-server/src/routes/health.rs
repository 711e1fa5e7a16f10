// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use envault_server_api::{HealthResponse, HealthStatus};

use crate::api::AppState;

#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Database reachable", body = HealthResponse),
		(status = 503, description = "Database unreachable", body = HealthResponse)
	),
	tag = "health"
)]
/// GET /health - Storage liveness.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	match envault_server_db::ping(&state.pool).await {
		Ok(()) => (
			StatusCode::OK,
			Json(HealthResponse {
				status: HealthStatus::Healthy,
			}),
		),
		Err(e) => {
			tracing::warn!(error = %e, "health check failed");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthResponse {
					status: HealthStatus::Unhealthy,
				}),
			)
		}
	}
}
