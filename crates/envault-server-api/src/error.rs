// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
	AccessDenied,
	Unauthorized,
	BadRequest,
	NotFound,
	InternalError,
}

impl ErrorCode {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorCode::AccessDenied => "access_denied",
			ErrorCode::Unauthorized => "unauthorized",
			ErrorCode::BadRequest => "bad_request",
			ErrorCode::NotFound => "not_found",
			ErrorCode::InternalError => "internal_error",
		}
	}

	pub fn status_code(&self) -> u16 {
		match self {
			ErrorCode::AccessDenied => 403,
			ErrorCode::Unauthorized => 401,
			ErrorCode::BadRequest => 400,
			ErrorCode::NotFound => 404,
			ErrorCode::InternalError => 500,
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
	pub error: ErrorCode,
	pub message: String,
	pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
	pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			error,
			message: message.into(),
			timestamp: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serializes_code_as_snake_case() {
		let body = ErrorResponse::new(ErrorCode::AccessDenied, "nope");
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["error"], "access_denied");
		assert_eq!(json["message"], "nope");
		assert!(json["timestamp"].is_string());
	}

	#[test]
	fn as_str_matches_serde() {
		for code in [
			ErrorCode::AccessDenied,
			ErrorCode::Unauthorized,
			ErrorCode::BadRequest,
			ErrorCode::NotFound,
			ErrorCode::InternalError,
		] {
			assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
		}
	}
}
