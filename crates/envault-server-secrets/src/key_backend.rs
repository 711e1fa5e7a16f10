// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key backend: data key lifecycle plus the envelope cipher.
//!
//! [`KeyBackend`] is the narrow capability the service depends on. The
//! [`LocalKeyBackend`] keeps wrapped data keys in the key vault table and
//! unwraps them with a key-encryption key derived from the local master key.
//! A hosted KMS would be another implementation of the same trait.
//!
//! # Alias races
//!
//! Creating a data key claims its alias through the storage layer's unique
//! constraint. When two callers (possibly in different processes) race on a
//! fresh alias, the loser gets [`SecretsError::KeyCreationRace`] and
//! [`KeyBackend::ensure_data_key`] resolves it by looking the alias up again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use envault_common_secret::SecretBytes;
use envault_server_config::KmsProvider;
use envault_server_db::{CreateDataKeyParams, DbError, KeyVaultStore};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::encryption::{self, KEK_SIZE};
use crate::error::{SecretsError, SecretsResult};
use crate::master_key::MasterKey;
use crate::types::{DataKeyId, KeyInfo, KeyStatus};

#[async_trait]
pub trait KeyBackend: Send + Sync {
	/// Resolve an alias to its data key id.
	async fn lookup_data_key(&self, alias: &str) -> SecretsResult<Option<DataKeyId>>;

	/// Create a data key under `alias`. Fails with `KeyCreationRace` if the
	/// alias is already claimed.
	async fn create_data_key(&self, alias: &str) -> SecretsResult<DataKeyId>;

	/// Public metadata for the key behind `alias`.
	async fn find_key_by_alias(&self, alias: &str) -> SecretsResult<KeyInfo>;

	/// Seal `plaintext` under the given data key.
	async fn encrypt(&self, key_id: &DataKeyId, plaintext: &[u8]) -> SecretsResult<Vec<u8>>;

	/// Open an envelope. Any unreadable input yields `Decryption`.
	async fn decrypt(&self, ciphertext: &[u8]) -> SecretsResult<Zeroizing<Vec<u8>>>;

	/// Look `alias` up, creating the key if it does not exist yet.
	async fn ensure_data_key(&self, alias: &str) -> SecretsResult<DataKeyId> {
		if let Some(id) = self.lookup_data_key(alias).await? {
			return Ok(id);
		}

		match self.create_data_key(alias).await {
			Ok(id) => Ok(id),
			Err(SecretsError::KeyCreationRace(_)) => {
				info!(alias = %alias, "lost data key creation race, using existing key");
				self.lookup_data_key(alias).await?.ok_or_else(|| {
					SecretsError::Internal(format!("alias {alias} claimed but not readable"))
				})
			}
			Err(e) => Err(e),
		}
	}

	/// Prove the data key is usable with the current master key by sealing
	/// and opening a fixed check value.
	async fn verify_data_key(&self, key_id: &DataKeyId) -> SecretsResult<()> {
		const CHECK: &[u8] = b"envault key check";

		let envelope = self.encrypt(key_id, CHECK).await?;
		let opened = self.decrypt(&envelope).await?;
		if opened.as_slice() != CHECK {
			return Err(SecretsError::Decryption(format!(
				"data key {key_id} failed round trip"
			)));
		}
		Ok(())
	}
}

/// Data keys stored in SQLite, wrapped under the local master key.
pub struct LocalKeyBackend<S: KeyVaultStore> {
	kek: Zeroizing<[u8; KEK_SIZE]>,
	provider: KmsProvider,
	store: Arc<S>,
	/// Unwrapped data keys by id. Records never change once written.
	cache: RwLock<HashMap<Uuid, SecretBytes>>,
}

impl<S: KeyVaultStore> fmt::Debug for LocalKeyBackend<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalKeyBackend")
			.field("kek", &envault_common_secret::REDACTED)
			.field("provider", &self.provider)
			.finish_non_exhaustive()
	}
}

impl<S: KeyVaultStore> LocalKeyBackend<S> {
	pub fn new(
		provider: KmsProvider,
		master_key: &MasterKey,
		store: Arc<S>,
	) -> SecretsResult<Self> {
		Ok(Self {
			kek: master_key.derive_kek()?,
			provider,
			store,
			cache: RwLock::new(HashMap::new()),
		})
	}

	/// Fetch and unwrap a data key. `Ok(None)` if no such record exists.
	async fn data_key(&self, id: &Uuid) -> SecretsResult<Option<SecretBytes>> {
		if let Some(key) = self.cache.read().await.get(id) {
			return Ok(Some(key.clone()));
		}

		let Some(row) = self.store.get_data_key_by_id(id).await? else {
			return Ok(None);
		};

		if row.provider != self.provider.as_str() {
			return Err(SecretsError::Decryption(format!(
				"data key {id} belongs to provider {}",
				row.provider
			)));
		}

		let dek = encryption::unwrap_data_key(&self.kek, id, &row.wrapped_key)?;
		let key = SecretBytes::new(dek.to_vec());
		self.cache.write().await.insert(*id, key.clone());

		debug!(key_id = %id, "data key unwrapped");
		Ok(Some(key))
	}
}

#[async_trait]
impl<S: KeyVaultStore> KeyBackend for LocalKeyBackend<S> {
	#[instrument(skip(self))]
	async fn lookup_data_key(&self, alias: &str) -> SecretsResult<Option<DataKeyId>> {
		let row = self.store.get_data_key_by_alias(alias).await?;
		Ok(row.map(|r| DataKeyId::new(r.id)))
	}

	#[instrument(skip(self))]
	async fn create_data_key(&self, alias: &str) -> SecretsResult<DataKeyId> {
		let id = DataKeyId::generate();
		let dek = encryption::generate_data_key();
		let wrapped = encryption::wrap_data_key(&self.kek, id.as_uuid(), &dek)?;

		let params = CreateDataKeyParams {
			id: id.into_inner(),
			aliases: vec![alias.to_string()],
			wrapped_key: wrapped,
			provider: self.provider.as_str().to_string(),
			created_at: Utc::now(),
		};

		match self.store.create_data_key(&params).await {
			Ok(()) => {}
			Err(DbError::Conflict(msg)) => return Err(SecretsError::KeyCreationRace(msg)),
			Err(e) => return Err(e.into()),
		}

		self
			.cache
			.write()
			.await
			.insert(id.into_inner(), SecretBytes::new(dek.to_vec()));

		info!(key_id = %id, alias = %alias, "data key created");
		Ok(id)
	}

	#[instrument(skip(self))]
	async fn find_key_by_alias(&self, alias: &str) -> SecretsResult<KeyInfo> {
		let row = self
			.store
			.get_data_key_by_alias(alias)
			.await?
			.ok_or_else(|| SecretsError::KeyNotFound(alias.to_string()))?;

		Ok(KeyInfo {
			key_alt_name: alias.to_string(),
			key_id: DataKeyId::new(row.id),
			status: KeyStatus::Active,
			provider: row.provider,
		})
	}

	#[instrument(skip(self, plaintext), fields(key_id = %key_id))]
	async fn encrypt(&self, key_id: &DataKeyId, plaintext: &[u8]) -> SecretsResult<Vec<u8>> {
		let dek = self
			.data_key(key_id.as_uuid())
			.await?
			.ok_or_else(|| SecretsError::Encryption(format!("data key {key_id} not found")))?;

		encryption::seal(dek.expose(), key_id.as_uuid(), plaintext)
	}

	#[instrument(skip(self, ciphertext), fields(len = ciphertext.len()))]
	async fn decrypt(&self, ciphertext: &[u8]) -> SecretsResult<Zeroizing<Vec<u8>>> {
		let key_id = encryption::envelope_key_id(ciphertext)?;

		let dek = self
			.data_key(&key_id)
			.await?
			.ok_or_else(|| SecretsError::Decryption(format!("data key {key_id} not found")))?;

		encryption::open(dek.expose(), ciphertext)
	}
}
