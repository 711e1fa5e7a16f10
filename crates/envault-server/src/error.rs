// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use envault_server_api::{ErrorCode, ErrorResponse};
use envault_server_secrets::SecretsError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Secrets(#[from] SecretsError),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Unauthorized: {0}")]
	Unauthorized(String),
}

impl ServerError {
	fn code_and_message(&self) -> (ErrorCode, String) {
		match self {
			ServerError::Secrets(SecretsError::AccessDenied(app_id)) => (
				ErrorCode::AccessDenied,
				format!("Access denied for app: {app_id}"),
			),
			ServerError::Secrets(SecretsError::KeyNotFound(alias)) => (
				ErrorCode::NotFound,
				format!("Key not found for alias: {alias}"),
			),
			ServerError::Secrets(e) => {
				tracing::error!(error = %e, "request failed");
				(
					ErrorCode::InternalError,
					"An internal error occurred".to_string(),
				)
			}
			ServerError::BadRequest(msg) => (ErrorCode::BadRequest, msg.clone()),
			ServerError::Unauthorized(msg) => (ErrorCode::Unauthorized, msg.clone()),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (code, message) = self.code_and_message();
		let status = StatusCode::from_u16(code.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(ErrorResponse::new(code, message))).into_response()
	}
}
