// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret envelope repository.
//!
//! One row per application holds the current ciphertext and the time it was
//! written. Rows older than the TTL are filtered out on read and physically
//! removed by [`SecretsRepository::delete_expired`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::Result;
use crate::types::{format_timestamp, parse_timestamp};

/// Stored secret envelope.
#[derive(Debug, Clone)]
pub struct SecretEnvelopeRow {
	pub app_id: String,
	pub ciphertext: Vec<u8>,
	pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SecretsStore: Send + Sync {
	async fn get_envelope(
		&self,
		app_id: &str,
		created_after: DateTime<Utc>,
	) -> Result<Option<SecretEnvelopeRow>>;
	async fn replace_envelope(
		&self,
		app_id: &str,
		ciphertext: &[u8],
		created_at: DateTime<Utc>,
	) -> Result<()>;
	async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone)]
pub struct SecretsRepository {
	pool: SqlitePool,
}

impl SecretsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch the envelope for `app_id` if it was written after `created_after`.
	#[tracing::instrument(skip(self), fields(app_id = %app_id))]
	pub async fn get_envelope(
		&self,
		app_id: &str,
		created_after: DateTime<Utc>,
	) -> Result<Option<SecretEnvelopeRow>> {
		let row = sqlx::query(
			r#"
			SELECT app_id, ciphertext, created_at
			FROM secrets
			WHERE app_id = ? AND created_at > ?
			"#,
		)
		.bind(app_id)
		.bind(format_timestamp(created_after))
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_envelope_row(&row)?)),
			None => Ok(None),
		}
	}

	/// Replace the envelope for `app_id` in one statement.
	///
	/// Ciphertext and timestamp change together, so readers see either the old
	/// pair or the new one.
	#[tracing::instrument(skip(self, ciphertext), fields(app_id = %app_id, len = ciphertext.len()))]
	pub async fn replace_envelope(
		&self,
		app_id: &str,
		ciphertext: &[u8],
		created_at: DateTime<Utc>,
	) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO secrets (app_id, ciphertext, created_at)
			VALUES (?, ?, ?)
			ON CONFLICT(app_id) DO UPDATE SET
				ciphertext = excluded.ciphertext,
				created_at = excluded.created_at
			"#,
		)
		.bind(app_id)
		.bind(ciphertext)
		.bind(format_timestamp(created_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(app_id = %app_id, "secret envelope replaced");
		Ok(())
	}

	/// Delete envelopes written at or before `cutoff`. Returns the count.
	#[tracing::instrument(skip(self))]
	pub async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		let result = sqlx::query("DELETE FROM secrets WHERE created_at <= ?")
			.bind(format_timestamp(cutoff))
			.execute(&self.pool)
			.await?;

		tracing::debug!(deleted = result.rows_affected(), "expired envelopes purged");
		Ok(result.rows_affected())
	}
}

#[async_trait]
impl SecretsStore for SecretsRepository {
	async fn get_envelope(
		&self,
		app_id: &str,
		created_after: DateTime<Utc>,
	) -> Result<Option<SecretEnvelopeRow>> {
		self.get_envelope(app_id, created_after).await
	}

	async fn replace_envelope(
		&self,
		app_id: &str,
		ciphertext: &[u8],
		created_at: DateTime<Utc>,
	) -> Result<()> {
		self.replace_envelope(app_id, ciphertext, created_at).await
	}

	async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64> {
		self.delete_expired(cutoff).await
	}
}

fn parse_envelope_row(row: &sqlx::sqlite::SqliteRow) -> Result<SecretEnvelopeRow> {
	let created_at_str: String = row.get("created_at");

	Ok(SecretEnvelopeRow {
		app_id: row.get("app_id"),
		ciphertext: row.get("ciphertext"),
		created_at: parse_timestamp("created_at", &created_at_str)?,
	})
}
