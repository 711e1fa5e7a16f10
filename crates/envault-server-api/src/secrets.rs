// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API types for the per-application secret endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A secret value returned to its application.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
	pub app_id: String,
	pub secret_value: String,
	pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for SecretResponse {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SecretResponse")
			.field("app_id", &self.app_id)
			.field("secret_value", &"[REDACTED]")
			.field("created_at", &self.created_at)
			.finish()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecretStatus {
	Active,
	Unregistered,
}

/// Secret lifecycle without the value. Timing fields are omitted for
/// unregistered apps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SecretHealthResponse {
	pub app_id: String,
	pub status: SecretStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub generated_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in_seconds: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_expired: Option<bool>,
}

impl SecretHealthResponse {
	pub fn unregistered(app_id: impl Into<String>) -> Self {
		Self {
			app_id: app_id.into(),
			status: SecretStatus::Unregistered,
			generated_at: None,
			expires_in_seconds: None,
			is_expired: None,
		}
	}
}
