// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Administrative routes. All require the `X-ADMIN-KEY` header.

use axum::{
	extract::{Path, Query, State},
	Json,
};
use envault_server_api::{
	AllowedAppResponse, ErrorResponse, KeyInfoResponse, KeyQuery, MessageResponse,
	RegisterAppRequest,
};

use crate::api::AppState;
use crate::error::ServerError;

#[utoipa::path(
	get,
	path = "/api/admin/keys",
	params(KeyQuery),
	responses(
		(status = 200, description = "Data key metadata", body = KeyInfoResponse),
		(status = 401, description = "Missing or invalid admin key", body = ErrorResponse),
		(status = 404, description = "No key under that alias", body = ErrorResponse)
	),
	tag = "admin"
)]
pub async fn get_key(
	State(state): State<AppState>,
	Query(query): Query<KeyQuery>,
) -> Result<Json<KeyInfoResponse>, ServerError> {
	let info = state.vault.find_key(query.alt_name.as_deref()).await?;
	Ok(Json(KeyInfoResponse {
		key_alt_name: info.key_alt_name,
		key_id: info.key_id.to_string(),
		status: info.status.to_string(),
		provider: info.provider,
	}))
}

#[utoipa::path(
	get,
	path = "/api/admin/apps",
	responses(
		(status = 200, description = "Registered apps", body = [AllowedAppResponse]),
		(status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
	),
	tag = "admin"
)]
pub async fn list_apps(
	State(state): State<AppState>,
) -> Result<Json<Vec<AllowedAppResponse>>, ServerError> {
	let apps = state.vault.list_apps().await?;
	Ok(Json(
		apps
			.into_iter()
			.map(|a| AllowedAppResponse {
				app_id: a.app_id,
				description: a.description,
				registered_at: a.registered_at,
			})
			.collect(),
	))
}

#[utoipa::path(
	post,
	path = "/api/admin/apps",
	request_body = RegisterAppRequest,
	responses(
		(status = 200, description = "App registered", body = MessageResponse),
		(status = 400, description = "Blank appId", body = ErrorResponse),
		(status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
	),
	tag = "admin"
)]
pub async fn register_app(
	State(state): State<AppState>,
	Json(payload): Json<RegisterAppRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
	let app_id = payload.app_id.trim();
	if app_id.is_empty() {
		return Err(ServerError::BadRequest("appId must not be blank".to_string()));
	}

	state
		.vault
		.register_app(app_id, payload.description.as_deref())
		.await?;
	Ok(Json(MessageResponse::new(format!("App registered: {app_id}"))))
}

#[utoipa::path(
	delete,
	path = "/api/admin/apps/{app_id}",
	params(("app_id" = String, Path, description = "Application identity")),
	responses(
		(status = 200, description = "App removed (or was absent)", body = MessageResponse),
		(status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
	),
	tag = "admin"
)]
pub async fn remove_app(
	State(state): State<AppState>,
	Path(app_id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
	state.vault.remove_app(&app_id).await?;
	Ok(Json(MessageResponse::new(format!("App removed: {app_id}"))))
}
