// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Allow-list of application identities permitted to read and rotate secrets.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::Result;
use crate::types::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedAppRow {
	pub app_id: String,
	pub description: Option<String>,
	pub registered_at: DateTime<Utc>,
}

#[async_trait]
pub trait AllowedAppStore: Send + Sync {
	async fn upsert_allowed_app(
		&self,
		app_id: &str,
		description: Option<&str>,
		registered_at: DateTime<Utc>,
	) -> Result<()>;
	async fn is_app_allowed(&self, app_id: &str) -> Result<bool>;
	async fn delete_allowed_app(&self, app_id: &str) -> Result<bool>;
	async fn list_allowed_apps(&self) -> Result<Vec<AllowedAppRow>>;
}

#[derive(Clone)]
pub struct AllowedAppRepository {
	pool: SqlitePool,
}

impl AllowedAppRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Register `app_id`, or refresh its description and registration time.
	#[tracing::instrument(skip(self, description), fields(app_id = %app_id))]
	pub async fn upsert_allowed_app(
		&self,
		app_id: &str,
		description: Option<&str>,
		registered_at: DateTime<Utc>,
	) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO allowed_apps (app_id, description, registered_at)
			VALUES (?, ?, ?)
			ON CONFLICT(app_id) DO UPDATE SET
				description = excluded.description,
				registered_at = excluded.registered_at
			"#,
		)
		.bind(app_id)
		.bind(description)
		.bind(format_timestamp(registered_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(app_id = %app_id, "allowed app upserted");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(app_id = %app_id))]
	pub async fn is_app_allowed(&self, app_id: &str) -> Result<bool> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM allowed_apps WHERE app_id = ?")
			.bind(app_id)
			.fetch_one(&self.pool)
			.await?;

		Ok(count > 0)
	}

	/// Remove `app_id`. Returns false if it was not registered.
	#[tracing::instrument(skip(self), fields(app_id = %app_id))]
	pub async fn delete_allowed_app(&self, app_id: &str) -> Result<bool> {
		let result = sqlx::query("DELETE FROM allowed_apps WHERE app_id = ?")
			.bind(app_id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_allowed_apps(&self) -> Result<Vec<AllowedAppRow>> {
		let rows = sqlx::query(
			r#"
			SELECT app_id, description, registered_at
			FROM allowed_apps
			ORDER BY registered_at, app_id
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_allowed_app_row).collect()
	}
}

#[async_trait]
impl AllowedAppStore for AllowedAppRepository {
	async fn upsert_allowed_app(
		&self,
		app_id: &str,
		description: Option<&str>,
		registered_at: DateTime<Utc>,
	) -> Result<()> {
		self
			.upsert_allowed_app(app_id, description, registered_at)
			.await
	}

	async fn is_app_allowed(&self, app_id: &str) -> Result<bool> {
		self.is_app_allowed(app_id).await
	}

	async fn delete_allowed_app(&self, app_id: &str) -> Result<bool> {
		self.delete_allowed_app(app_id).await
	}

	async fn list_allowed_apps(&self) -> Result<Vec<AllowedAppRow>> {
		self.list_allowed_apps().await
	}
}

fn parse_allowed_app_row(row: &sqlx::sqlite::SqliteRow) -> Result<AllowedAppRow> {
	let registered_at_str: String = row.get("registered_at");

	Ok(AllowedAppRow {
		app_id: row.get("app_id"),
		description: row.get("description"),
		registered_at: parse_timestamp("registered_at", &registered_at_str)?,
	})
}
