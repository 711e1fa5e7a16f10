// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-application secret routes.
//!
//! No credential is required; the app registry decides access.
//!
//! Endpoints:
//! - `GET /api/secrets/{app_id}` - Current secret, generated on first use
//! - `POST /api/secrets/{app_id}/rotate` - Replace the secret
//! - `GET /api/secrets/{app_id}/health` - Lifecycle without the value

use axum::{
	extract::{Path, State},
	Json,
};
use envault_server_api::{ErrorResponse, SecretHealthResponse, SecretResponse, SecretStatus};
use envault_server_secrets::{AppSecret, SecretHealth};

use crate::api::AppState;
use crate::error::ServerError;

fn to_response(secret: AppSecret) -> SecretResponse {
	SecretResponse {
		app_id: secret.app_id,
		secret_value: secret.secret_value.expose().clone(),
		created_at: secret.created_at,
	}
}

#[utoipa::path(
	get,
	path = "/api/secrets/{app_id}",
	params(("app_id" = String, Path, description = "Application identity")),
	responses(
		(status = 200, description = "Current secret", body = SecretResponse),
		(status = 403, description = "App not registered", body = ErrorResponse),
		(status = 500, description = "Internal error", body = ErrorResponse)
	),
	tag = "secrets"
)]
pub async fn get_secret(
	State(state): State<AppState>,
	Path(app_id): Path<String>,
) -> Result<Json<SecretResponse>, ServerError> {
	let secret = state.vault.get_secret(&app_id).await?;
	Ok(Json(to_response(secret)))
}

#[utoipa::path(
	post,
	path = "/api/secrets/{app_id}/rotate",
	params(("app_id" = String, Path, description = "Application identity")),
	responses(
		(status = 200, description = "New secret", body = SecretResponse),
		(status = 403, description = "App not registered", body = ErrorResponse),
		(status = 500, description = "Internal error", body = ErrorResponse)
	),
	tag = "secrets"
)]
pub async fn rotate_secret(
	State(state): State<AppState>,
	Path(app_id): Path<String>,
) -> Result<Json<SecretResponse>, ServerError> {
	let secret = state.vault.rotate_secret(&app_id).await?;
	Ok(Json(to_response(secret)))
}

#[utoipa::path(
	get,
	path = "/api/secrets/{app_id}/health",
	params(("app_id" = String, Path, description = "Application identity")),
	responses(
		(status = 200, description = "Secret lifecycle", body = SecretHealthResponse),
		(status = 500, description = "Internal error", body = ErrorResponse)
	),
	tag = "secrets"
)]
pub async fn secret_health(
	State(state): State<AppState>,
	Path(app_id): Path<String>,
) -> Result<Json<SecretHealthResponse>, ServerError> {
	let response = match state.vault.check_health(&app_id).await? {
		SecretHealth::Unregistered => SecretHealthResponse::unregistered(app_id),
		SecretHealth::Active {
			generated_at,
			expires_in_seconds,
			is_expired,
		} => SecretHealthResponse {
			app_id,
			status: SecretStatus::Active,
			generated_at: Some(generated_at),
			expires_in_seconds: Some(expires_in_seconds),
			is_expired: Some(is_expired),
		},
	};
	Ok(Json(response))
}
