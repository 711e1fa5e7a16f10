// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the secret vault.

use envault_server_db::DbError;
use thiserror::Error;

pub type SecretsResult<T> = Result<T, SecretsError>;

#[derive(Debug, Error)]
pub enum SecretsError {
	// =========================================================================
	// Startup
	// =========================================================================
	#[error("configuration error: {0}")]
	Configuration(String),

	// =========================================================================
	// Caller-visible
	// =========================================================================
	#[error("access denied: {0}")]
	AccessDenied(String),

	#[error("key not found: {0}")]
	KeyNotFound(String),

	// =========================================================================
	// Absorbed inside the vault
	// =========================================================================
	#[error("decryption failed: {0}")]
	Decryption(String),

	#[error("data key alias already claimed: {0}")]
	KeyCreationRace(String),

	// =========================================================================
	// Infrastructure
	// =========================================================================
	#[error("encryption failed: {0}")]
	Encryption(String),

	#[error("database error: {0}")]
	Database(#[from] DbError),

	#[error("internal error: {0}")]
	Internal(String),
}

impl SecretsError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(
			self,
			SecretsError::Configuration(_)
				| SecretsError::Encryption(_)
				| SecretsError::Database(_)
				| SecretsError::Internal(_)
		)
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			SecretsError::AccessDenied(_) => 403,
			SecretsError::KeyNotFound(_) => 404,
			SecretsError::Configuration(_)
			| SecretsError::Decryption(_)
			| SecretsError::KeyCreationRace(_)
			| SecretsError::Encryption(_)
			| SecretsError::Database(_)
			| SecretsError::Internal(_) => 500,
		}
	}
}
