// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key vault repository.
//!
//! A data key record holds wrapped key material plus the KMS provider tag.
//! Aliases live in `key_alt_names`, whose primary key makes each alias
//! resolve to at most one record. A record and its aliases are written in a
//! single transaction, so a losing insert leaves nothing behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::{is_unique_constraint_error, DbError, Result};
use crate::types::{format_timestamp, parse_timestamp};

/// Stored data key record.
#[derive(Debug, Clone)]
pub struct DataKeyRow {
	pub id: Uuid,
	pub aliases: Vec<String>,
	pub wrapped_key: Vec<u8>,
	pub provider: String,
	pub created_at: DateTime<Utc>,
}

/// Parameters for creating a data key record.
#[derive(Debug, Clone)]
pub struct CreateDataKeyParams {
	pub id: Uuid,
	pub aliases: Vec<String>,
	pub wrapped_key: Vec<u8>,
	pub provider: String,
	pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait KeyVaultStore: Send + Sync {
	async fn create_data_key(&self, params: &CreateDataKeyParams) -> Result<()>;
	async fn get_data_key_by_alias(&self, alias: &str) -> Result<Option<DataKeyRow>>;
	async fn get_data_key_by_id(&self, id: &Uuid) -> Result<Option<DataKeyRow>>;
}

#[derive(Clone)]
pub struct KeyVaultRepository {
	pool: SqlitePool,
}

impl KeyVaultRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a data key and claim its aliases.
	///
	/// Returns `Err(DbError::Conflict)` if any alias is already taken. The
	/// caller should look the alias up again rather than retry.
	#[tracing::instrument(skip(self, params), fields(key_id = %params.id, aliases = ?params.aliases))]
	pub async fn create_data_key(&self, params: &CreateDataKeyParams) -> Result<()> {
		if params.aliases.is_empty() {
			return Err(DbError::Internal("data key needs at least one alias".into()));
		}

		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			INSERT INTO key_vault (id, wrapped_key, provider, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(params.id.to_string())
		.bind(&params.wrapped_key)
		.bind(&params.provider)
		.bind(format_timestamp(params.created_at))
		.execute(&mut *tx)
		.await?;

		for alias in &params.aliases {
			let result = sqlx::query("INSERT INTO key_alt_names (alias, key_id) VALUES (?, ?)")
				.bind(alias)
				.bind(params.id.to_string())
				.execute(&mut *tx)
				.await;

			match result {
				Ok(_) => {}
				Err(e) if is_unique_constraint_error(&e) => {
					return Err(DbError::Conflict(format!("key alias already exists: {alias}")));
				}
				Err(e) => return Err(DbError::Sqlx(e)),
			}
		}

		tx.commit().await?;

		tracing::debug!(key_id = %params.id, "data key created");
		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_data_key_by_alias(&self, alias: &str) -> Result<Option<DataKeyRow>> {
		let key_id: Option<String> =
			sqlx::query_scalar("SELECT key_id FROM key_alt_names WHERE alias = ?")
				.bind(alias)
				.fetch_optional(&self.pool)
				.await?;

		match key_id {
			Some(id) => self.load(&id).await,
			None => Ok(None),
		}
	}

	#[tracing::instrument(skip(self), fields(key_id = %id))]
	pub async fn get_data_key_by_id(&self, id: &Uuid) -> Result<Option<DataKeyRow>> {
		self.load(&id.to_string()).await
	}

	async fn load(&self, id: &str) -> Result<Option<DataKeyRow>> {
		let row = sqlx::query(
			r#"
			SELECT id, wrapped_key, provider, created_at
			FROM key_vault
			WHERE id = ?
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let aliases: Vec<String> =
			sqlx::query_scalar("SELECT alias FROM key_alt_names WHERE key_id = ? ORDER BY alias")
				.bind(id)
				.fetch_all(&self.pool)
				.await?;

		Ok(Some(parse_data_key_row(&row, aliases)?))
	}
}

#[async_trait]
impl KeyVaultStore for KeyVaultRepository {
	async fn create_data_key(&self, params: &CreateDataKeyParams) -> Result<()> {
		self.create_data_key(params).await
	}

	async fn get_data_key_by_alias(&self, alias: &str) -> Result<Option<DataKeyRow>> {
		self.get_data_key_by_alias(alias).await
	}

	async fn get_data_key_by_id(&self, id: &Uuid) -> Result<Option<DataKeyRow>> {
		self.get_data_key_by_id(id).await
	}
}

fn parse_data_key_row(row: &sqlx::sqlite::SqliteRow, aliases: Vec<String>) -> Result<DataKeyRow> {
	let id_str: String = row.get("id");
	let created_at_str: String = row.get("created_at");

	Ok(DataKeyRow {
		id: Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid key id UUID: {e}")))?,
		aliases,
		wrapped_key: row.get("wrapped_key"),
		provider: row.get("provider"),
		created_at: parse_timestamp("created_at", &created_at_str)?,
	})
}
