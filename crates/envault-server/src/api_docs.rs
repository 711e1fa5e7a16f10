// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI document for the envault HTTP API.

use envault_server_api::{
	AllowedAppResponse, ErrorCode, ErrorResponse, HealthResponse, HealthStatus, KeyInfoResponse,
	MessageResponse, RegisterAppRequest, SecretHealthResponse, SecretResponse, SecretStatus,
};
use utoipa::OpenApi;

use crate::routes;

#[derive(OpenApi)]
#[openapi(
	info(title = "envault", description = "Per-application secret vault"),
	paths(
		routes::health::health_check,
		routes::secrets::get_secret,
		routes::secrets::rotate_secret,
		routes::secrets::secret_health,
		routes::admin::get_key,
		routes::admin::list_apps,
		routes::admin::register_app,
		routes::admin::remove_app,
	),
	components(schemas(
		AllowedAppResponse,
		ErrorCode,
		ErrorResponse,
		HealthResponse,
		HealthStatus,
		KeyInfoResponse,
		MessageResponse,
		RegisterAppRequest,
		SecretHealthResponse,
		SecretResponse,
		SecretStatus,
	)),
	tags(
		(name = "secrets", description = "Application secret reads and rotation"),
		(name = "admin", description = "App registry and key metadata"),
		(name = "health", description = "Liveness")
	)
)]
pub struct ApiDoc;
