// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{delete, get, post},
	Router,
};
use envault_common_secret::SecretString;
use envault_server_config::AdminConfig;
use envault_server_db::SqlitePool;
use envault_server_secrets::{DefaultVaultService, VaultContext};

use crate::admin_auth::require_admin_key;
use crate::routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub vault: Arc<DefaultVaultService>,
	pub pool: SqlitePool,
	pub admin_api_key: Arc<SecretString>,
}

pub fn create_app_state(ctx: &VaultContext, admin: &AdminConfig) -> AppState {
	AppState {
		vault: ctx.service(),
		pool: ctx.pool().clone(),
		admin_api_key: Arc::new(admin.api_key.clone()),
	}
}

pub fn create_router(state: AppState) -> Router {
	let admin = Router::new()
		.route("/api/admin/keys", get(routes::admin::get_key))
		.route(
			"/api/admin/apps",
			get(routes::admin::list_apps).post(routes::admin::register_app),
		)
		.route("/api/admin/apps/{app_id}", delete(routes::admin::remove_app))
		.route_layer(from_fn_with_state(state.clone(), require_admin_key));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(routes::docs::openapi_json))
		.route("/api/secrets/{app_id}", get(routes::secrets::get_secret))
		.route(
			"/api/secrets/{app_id}/rotate",
			post(routes::secrets::rotate_secret),
		)
		.route(
			"/api/secrets/{app_id}/health",
			get(routes::secrets::secret_health),
		)
		.merge(admin)
		.with_state(state)
}
