// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide vault resources.
//!
//! [`VaultContext`] owns the connection pool, the unwrapped key material and
//! the active data key id. It is built once at startup and handed to the HTTP
//! layer; [`VaultContext::shutdown`] releases the pool.

use std::sync::Arc;
use std::time::Duration;

use envault_server_config::{ServerConfig, VaultConfig};
use envault_server_db::{
	create_pool, run_migrations, AllowedAppRepository, KeyVaultRepository, SecretsRepository,
	SqlitePool,
};
use tracing::info;

use crate::error::{SecretsError, SecretsResult};
use crate::key_backend::{KeyBackend, LocalKeyBackend};
use crate::master_key::MasterKey;
use crate::registry::SqliteAccessRegistry;
use crate::service::SecretVaultService;
use crate::store::SqliteSecretStore;

pub type DefaultVaultService = SecretVaultService<
	LocalKeyBackend<KeyVaultRepository>,
	SqliteSecretStore<SecretsRepository>,
	SqliteAccessRegistry<AllowedAppRepository>,
>;

pub struct VaultContext {
	pool: SqlitePool,
	service: Arc<DefaultVaultService>,
}

impl VaultContext {
	/// Open storage and bring the vault up.
	///
	/// Every failure is a `Configuration` error. A pool opened before the
	/// failure is closed before returning.
	pub async fn initialize(config: &ServerConfig) -> SecretsResult<Self> {
		let pool = open_pool(config).await?;

		match Self::with_pool(pool.clone(), &config.vault).await {
			Ok(ctx) => Ok(ctx),
			Err(e) => {
				pool.close().await;
				Err(e)
			}
		}
	}

	/// Build the vault on an existing pool.
	pub async fn with_pool(pool: SqlitePool, vault: &VaultConfig) -> SecretsResult<Self> {
		run_migrations(&pool)
			.await
			.map_err(|e| SecretsError::Configuration(format!("migrations failed: {e}")))?;

		let master_key = MasterKey::load(&vault.master_key_path)?;
		let key_backend = Arc::new(LocalKeyBackend::new(
			vault.kms_provider,
			&master_key,
			Arc::new(KeyVaultRepository::new(pool.clone())),
		)?);
		drop(master_key);

		let active_key_id = key_backend
			.ensure_data_key(&vault.key_alias)
			.await
			.map_err(|e| match e {
				SecretsError::Configuration(_) => e,
				other => SecretsError::Configuration(format!(
					"cannot resolve data key '{}': {other}",
					vault.key_alias
				)),
			})?;

		key_backend
			.verify_data_key(&active_key_id)
			.await
			.map_err(|e| {
				SecretsError::Configuration(format!(
					"data key '{}' is unusable with this master key: {e}",
					vault.key_alias
				))
			})?;

		let ttl = Duration::from_secs(vault.secret_ttl_secs);
		let store = Arc::new(SqliteSecretStore::new(
			Arc::new(SecretsRepository::new(pool.clone())),
			ttl,
		)?);
		let registry = Arc::new(SqliteAccessRegistry::new(Arc::new(
			AllowedAppRepository::new(pool.clone()),
		)));

		let service = Arc::new(SecretVaultService::new(
			key_backend,
			store,
			registry,
			active_key_id,
			vault.key_alias.clone(),
			ttl,
		));

		info!(
			key_id = %active_key_id,
			alias = %vault.key_alias,
			provider = %vault.kms_provider,
			"vault initialized"
		);

		Ok(Self { pool, service })
	}

	pub fn service(&self) -> Arc<DefaultVaultService> {
		Arc::clone(&self.service)
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Release storage. Consumes the context.
	pub async fn shutdown(self) {
		self.pool.close().await;
		info!("vault shut down");
	}
}

/// Delete envelopes older than the configured TTL and return the count.
///
/// Needs storage only; the master key is not loaded.
pub async fn purge_expired(config: &ServerConfig) -> SecretsResult<u64> {
	let pool = open_pool(config).await?;

	let result = purge_with_pool(&pool, config.vault.secret_ttl_secs).await;
	pool.close().await;
	result
}

async fn purge_with_pool(pool: &SqlitePool, ttl_secs: u64) -> SecretsResult<u64> {
	run_migrations(pool).await?;
	let store = SqliteSecretStore::new(
		Arc::new(SecretsRepository::new(pool.clone())),
		Duration::from_secs(ttl_secs),
	)?;
	store.purge_expired().await
}

async fn open_pool(config: &ServerConfig) -> SecretsResult<SqlitePool> {
	create_pool(&config.database.url, config.database.max_connections)
		.await
		.map_err(|e| SecretsError::Configuration(format!("cannot open database: {e}")))
}
