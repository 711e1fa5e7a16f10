// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain types returned by the vault.
//!
//! Plaintext only ever appears inside [`AppSecret::secret_value`], which is a
//! [`SecretString`] and prints as `[REDACTED]`.

use std::fmt;

use chrono::{DateTime, Utc};
use envault_common_secret::SecretString;
use envault_server_db::AllowedAppRow;
use uuid::Uuid;

/// Identifier of a data key record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataKeyId(Uuid);

impl DataKeyId {
	pub fn new(id: Uuid) -> Self {
		Self(id)
	}

	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}

	pub fn into_inner(self) -> Uuid {
		self.0
	}
}

impl fmt::Display for DataKeyId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<Uuid> for DataKeyId {
	fn from(id: Uuid) -> Self {
		Self(id)
	}
}

/// Lifecycle state of a data key. Records are never disabled, so every key
/// that resolves is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
	Active,
}

impl KeyStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			KeyStatus::Active => "Active",
		}
	}
}

impl fmt::Display for KeyStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Public metadata about a data key. Never carries key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
	pub key_alt_name: String,
	pub key_id: DataKeyId,
	pub status: KeyStatus,
	pub provider: String,
}

/// A decrypted application secret.
#[derive(Debug, Clone)]
pub struct AppSecret {
	pub app_id: String,
	pub secret_value: SecretString,
	pub created_at: DateTime<Utc>,
}

/// An application identity on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedApp {
	pub app_id: String,
	pub description: Option<String>,
	pub registered_at: DateTime<Utc>,
}

impl From<AllowedAppRow> for AllowedApp {
	fn from(row: AllowedAppRow) -> Self {
		Self {
			app_id: row.app_id,
			description: row.description,
			registered_at: row.registered_at,
		}
	}
}

/// Lifecycle view of an application's secret, without the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretHealth {
	Unregistered,
	Active {
		generated_at: DateTime<Utc>,
		expires_in_seconds: i64,
		is_expired: bool,
	},
}

impl SecretHealth {
	/// Compute remaining lifetime for a secret generated at `generated_at`.
	pub fn active(generated_at: DateTime<Utc>, ttl_secs: i64, now: DateTime<Utc>) -> Self {
		let remaining = ttl_secs - (now - generated_at).num_seconds();
		SecretHealth::Active {
			generated_at,
			expires_in_seconds: remaining.max(0),
			is_expired: remaining <= 0,
		}
	}
}
