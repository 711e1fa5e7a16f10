// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access registry: the allow-list gating every secret read and rotation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use envault_server_db::AllowedAppStore;

use crate::error::SecretsResult;
use crate::types::AllowedApp;

#[async_trait]
pub trait AccessRegistry: Send + Sync {
	/// Register or refresh an application. Idempotent.
	async fn register_app(&self, app_id: &str, description: Option<&str>) -> SecretsResult<()>;

	async fn is_app_allowed(&self, app_id: &str) -> SecretsResult<bool>;

	/// Remove an application. A no-op if it was never registered.
	async fn remove_app(&self, app_id: &str) -> SecretsResult<()>;

	async fn list_apps(&self) -> SecretsResult<Vec<AllowedApp>>;
}

pub struct SqliteAccessRegistry<S: AllowedAppStore> {
	repo: Arc<S>,
}

impl<S: AllowedAppStore> SqliteAccessRegistry<S> {
	pub fn new(repo: Arc<S>) -> Self {
		Self { repo }
	}
}

#[async_trait]
impl<S: AllowedAppStore> AccessRegistry for SqliteAccessRegistry<S> {
	async fn register_app(&self, app_id: &str, description: Option<&str>) -> SecretsResult<()> {
		self
			.repo
			.upsert_allowed_app(app_id, description, Utc::now())
			.await?;
		tracing::info!(app_id = %app_id, "app registered");
		Ok(())
	}

	async fn is_app_allowed(&self, app_id: &str) -> SecretsResult<bool> {
		Ok(self.repo.is_app_allowed(app_id).await?)
	}

	async fn remove_app(&self, app_id: &str) -> SecretsResult<()> {
		if self.repo.delete_allowed_app(app_id).await? {
			tracing::info!(app_id = %app_id, "app removed");
		}
		Ok(())
	}

	async fn list_apps(&self) -> SecretsResult<Vec<AllowedApp>> {
		let rows = self.repo.list_allowed_apps().await?;
		Ok(rows.into_iter().map(AllowedApp::from).collect())
	}
}
