// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared-key guard for the administrative routes.

use axum::{
	extract::{Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::error::ServerError;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Reject requests whose `X-ADMIN-KEY` header does not match the configured
/// key. The comparison is constant time.
pub async fn require_admin_key(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	let provided = request
		.headers()
		.get(ADMIN_KEY_HEADER)
		.and_then(|v| v.to_str().ok());
	let key_present = provided.is_some();
	let authorized = provided.is_some_and(|key| state.admin_api_key.matches(key));

	if authorized {
		return next.run(request).await;
	}

	tracing::warn!(
		path = %request.uri().path(),
		key_present,
		"admin request rejected"
	);
	ServerError::Unauthorized("Invalid or missing admin key".to_string()).into_response()
}
