// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret vault service.
//!
//! Every read and rotation passes the access registry first. Reads decrypt
//! the stored envelope; a missing, expired or unreadable envelope is replaced
//! by a freshly generated secret instead of surfacing an error.
//!
//! Concurrent rotations of one app are not ordered: the envelope that lands
//! last wins, whichever call started last. Callers that need strict ordering
//! must serialise rotations per app themselves.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use envault_common_secret::SecretString;
use tracing::{info, instrument, warn};

use crate::encryption;
use crate::error::{SecretsError, SecretsResult};
use crate::key_backend::KeyBackend;
use crate::registry::AccessRegistry;
use crate::store::SecretStore;
use crate::types::{AllowedApp, AppSecret, DataKeyId, KeyInfo, SecretHealth};

pub struct SecretVaultService<K: KeyBackend, S: SecretStore, R: AccessRegistry> {
	key_backend: Arc<K>,
	store: Arc<S>,
	registry: Arc<R>,
	active_key_id: DataKeyId,
	default_alias: String,
	ttl: Duration,
}

impl<K: KeyBackend, S: SecretStore, R: AccessRegistry> SecretVaultService<K, S, R> {
	pub fn new(
		key_backend: Arc<K>,
		store: Arc<S>,
		registry: Arc<R>,
		active_key_id: DataKeyId,
		default_alias: impl Into<String>,
		ttl: Duration,
	) -> Self {
		Self {
			key_backend,
			store,
			registry,
			active_key_id,
			default_alias: default_alias.into(),
			ttl,
		}
	}

	pub fn active_key_id(&self) -> DataKeyId {
		self.active_key_id
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Return the current secret for `app_id`, generating one if needed.
	#[instrument(skip(self))]
	pub async fn get_secret(&self, app_id: &str) -> SecretsResult<AppSecret> {
		self.ensure_allowed(app_id).await?;

		let Some(envelope) = self.store.find(app_id).await? else {
			info!(app_id = %app_id, "no live secret, generating");
			return self.regenerate(app_id).await;
		};

		match self.open(&envelope.ciphertext).await {
			Ok(secret_value) => Ok(AppSecret {
				app_id: app_id.to_string(),
				secret_value,
				created_at: envelope.created_at,
			}),
			Err(SecretsError::Decryption(reason)) => {
				warn!(app_id = %app_id, %reason, "stored secret unreadable, regenerating");
				self.regenerate(app_id).await
			}
			Err(e) => Err(e),
		}
	}

	/// Replace the secret for `app_id` with a new random value.
	#[instrument(skip(self))]
	pub async fn rotate_secret(&self, app_id: &str) -> SecretsResult<AppSecret> {
		self.ensure_allowed(app_id).await?;
		self.regenerate(app_id).await
	}

	/// Report lifecycle state without revealing the value.
	///
	/// For a registered app this reads the secret, so a missing one is
	/// generated as a side effect.
	#[instrument(skip(self))]
	pub async fn check_health(&self, app_id: &str) -> SecretsResult<SecretHealth> {
		if !self.registry.is_app_allowed(app_id).await? {
			return Ok(SecretHealth::Unregistered);
		}

		let secret = self.get_secret(app_id).await?;
		Ok(SecretHealth::active(
			secret.created_at,
			self.ttl.as_secs() as i64,
			Utc::now(),
		))
	}

	pub async fn register_app(&self, app_id: &str, description: Option<&str>) -> SecretsResult<()> {
		self.registry.register_app(app_id, description).await
	}

	/// Revoke access. The stored envelope is left to expire on its own.
	pub async fn remove_app(&self, app_id: &str) -> SecretsResult<()> {
		self.registry.remove_app(app_id).await
	}

	pub async fn list_apps(&self) -> SecretsResult<Vec<AllowedApp>> {
		self.registry.list_apps().await
	}

	/// Key metadata for `alias`, or for the configured alias when none is given.
	pub async fn find_key(&self, alias: Option<&str>) -> SecretsResult<KeyInfo> {
		let alias = match alias.map(str::trim) {
			Some(a) if !a.is_empty() => a,
			_ => self.default_alias.as_str(),
		};
		self.key_backend.find_key_by_alias(alias).await
	}

	async fn ensure_allowed(&self, app_id: &str) -> SecretsResult<()> {
		if self.registry.is_app_allowed(app_id).await? {
			return Ok(());
		}
		warn!(app_id = %app_id, "access denied for unregistered app");
		Err(SecretsError::AccessDenied(app_id.to_string()))
	}

	async fn open(&self, ciphertext: &[u8]) -> SecretsResult<SecretString> {
		let plaintext = self.key_backend.decrypt(ciphertext).await?;
		let value = std::str::from_utf8(&plaintext)
			.map_err(|_| SecretsError::Decryption("secret is not valid utf-8".into()))?;
		Ok(SecretString::new(value.to_string()))
	}

	async fn regenerate(&self, app_id: &str) -> SecretsResult<AppSecret> {
		let secret_value = encryption::generate_secret_value();
		let ciphertext = self
			.key_backend
			.encrypt(&self.active_key_id, secret_value.expose().as_bytes())
			.await?;

		// Storage keeps microseconds; truncate so later reads return the same instant.
		let now = Utc::now().trunc_subsecs(6);
		self.store.upsert(app_id, &ciphertext, now).await?;

		info!(app_id = %app_id, key_id = %self.active_key_id, "secret generated");
		Ok(AppSecret {
			app_id: app_id.to_string(),
			secret_value,
			created_at: now,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::key_backend::LocalKeyBackend;
	use crate::master_key::MasterKey;
	use crate::store::{SecretEnvelope, SqliteSecretStore};
	use async_trait::async_trait;
	use chrono::DateTime;
	use envault_server_config::KmsProvider;
	use envault_server_db::testing::create_test_pool;
	use envault_server_db::{KeyVaultRepository, SecretsRepository};
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	#[derive(Default)]
	struct CountingStore {
		envelopes: Mutex<HashMap<String, SecretEnvelope>>,
		calls: AtomicUsize,
	}

	impl CountingStore {
		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		fn put_raw(&self, app_id: &str, ciphertext: Vec<u8>) {
			self.envelopes.lock().unwrap().insert(
				app_id.to_string(),
				SecretEnvelope {
					app_id: app_id.to_string(),
					ciphertext,
					created_at: Utc::now(),
				},
			);
		}

		fn ciphertext(&self, app_id: &str) -> Option<Vec<u8>> {
			self
				.envelopes
				.lock()
				.unwrap()
				.get(app_id)
				.map(|e| e.ciphertext.clone())
		}
	}

	#[async_trait]
	impl SecretStore for CountingStore {
		async fn find(&self, app_id: &str) -> SecretsResult<Option<SecretEnvelope>> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.envelopes.lock().unwrap().get(app_id).cloned())
		}

		async fn upsert(
			&self,
			app_id: &str,
			ciphertext: &[u8],
			now: DateTime<Utc>,
		) -> SecretsResult<()> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.put_raw(app_id, ciphertext.to_vec());
			if let Some(e) = self.envelopes.lock().unwrap().get_mut(app_id) {
				e.created_at = now;
			}
			Ok(())
		}
	}

	#[derive(Default)]
	struct MemoryRegistry {
		apps: Mutex<HashMap<String, AllowedApp>>,
	}

	#[async_trait]
	impl AccessRegistry for MemoryRegistry {
		async fn register_app(&self, app_id: &str, description: Option<&str>) -> SecretsResult<()> {
			self.apps.lock().unwrap().insert(
				app_id.to_string(),
				AllowedApp {
					app_id: app_id.to_string(),
					description: description.map(str::to_string),
					registered_at: Utc::now(),
				},
			);
			Ok(())
		}

		async fn is_app_allowed(&self, app_id: &str) -> SecretsResult<bool> {
			Ok(self.apps.lock().unwrap().contains_key(app_id))
		}

		async fn remove_app(&self, app_id: &str) -> SecretsResult<()> {
			self.apps.lock().unwrap().remove(app_id);
			Ok(())
		}

		async fn list_apps(&self) -> SecretsResult<Vec<AllowedApp>> {
			Ok(self.apps.lock().unwrap().values().cloned().collect())
		}
	}

	type TestService<S> = SecretVaultService<LocalKeyBackend<KeyVaultRepository>, S, MemoryRegistry>;

	async fn key_backend() -> (Arc<LocalKeyBackend<KeyVaultRepository>>, DataKeyId) {
		let repo = Arc::new(KeyVaultRepository::new(create_test_pool().await));
		let backend =
			Arc::new(LocalKeyBackend::new(KmsProvider::Local, &MasterKey::generate(), repo).unwrap());
		let id = backend.ensure_data_key("test-alias").await.unwrap();
		(backend, id)
	}

	async fn service() -> (TestService<CountingStore>, Arc<CountingStore>) {
		let (backend, id) = key_backend().await;
		let store = Arc::new(CountingStore::default());
		let service = SecretVaultService::new(
			backend,
			store.clone(),
			Arc::new(MemoryRegistry::default()),
			id,
			"test-alias",
			Duration::from_secs(3600),
		);
		(service, store)
	}

	#[tokio::test]
	async fn unregistered_app_is_denied_without_touching_store() {
		let (service, store) = service().await;

		assert!(matches!(
			service.get_secret("intruder").await,
			Err(SecretsError::AccessDenied(_))
		));
		assert!(matches!(
			service.rotate_secret("intruder").await,
			Err(SecretsError::AccessDenied(_))
		));
		assert_eq!(store.calls(), 0);
	}

	#[tokio::test]
	async fn first_read_generates_and_second_read_repeats() {
		let (service, store) = service().await;
		service.register_app("payments", None).await.unwrap();

		let first = service.get_secret("payments").await.unwrap();
		assert_eq!(first.secret_value.expose().len(), 44);
		assert!(store.ciphertext("payments").is_some());

		let second = service.get_secret("payments").await.unwrap();
		assert_eq!(first.secret_value.expose(), second.secret_value.expose());
		assert_eq!(first.created_at, second.created_at);
	}

	#[tokio::test]
	async fn rotation_replaces_the_stored_value() {
		let (service, store) = service().await;
		service.register_app("payments", None).await.unwrap();

		let before = service.get_secret("payments").await.unwrap();
		let stored_before = store.ciphertext("payments").unwrap();
		let rotated = service.rotate_secret("payments").await.unwrap();

		assert_ne!(before.secret_value.expose(), rotated.secret_value.expose());
		assert_ne!(store.ciphertext("payments").unwrap(), stored_before);
		assert_eq!(
			service.get_secret("payments").await.unwrap().secret_value.expose(),
			rotated.secret_value.expose()
		);
	}

	#[tokio::test]
	async fn unreadable_envelope_is_regenerated() {
		let (service, store) = service().await;
		service.register_app("payments", None).await.unwrap();
		store.put_raw("payments", b"corrupted".to_vec());

		let secret = service.get_secret("payments").await.unwrap();
		assert_eq!(secret.secret_value.expose().len(), 44);
		assert_ne!(store.ciphertext("payments").unwrap(), b"corrupted".to_vec());
	}

	#[tokio::test]
	async fn payments_scenario() {
		let (service, _store) = service().await;
		service
			.register_app("payments", Some("billing"))
			.await
			.unwrap();

		let s1 = service.get_secret("payments").await.unwrap();
		let again = service.get_secret("payments").await.unwrap();
		assert_eq!(s1.secret_value.expose(), again.secret_value.expose());

		let s2 = service.rotate_secret("payments").await.unwrap();
		assert_ne!(s1.secret_value.expose(), s2.secret_value.expose());
		assert_eq!(
			service.get_secret("payments").await.unwrap().secret_value.expose(),
			s2.secret_value.expose()
		);

		service.remove_app("payments").await.unwrap();
		assert!(matches!(
			service.get_secret("payments").await,
			Err(SecretsError::AccessDenied(_))
		));
	}

	#[tokio::test]
	async fn removal_keeps_the_envelope() {
		let (service, store) = service().await;
		service.register_app("payments", None).await.unwrap();
		service.get_secret("payments").await.unwrap();

		service.remove_app("payments").await.unwrap();
		assert!(store.ciphertext("payments").is_some());
	}

	#[tokio::test]
	async fn expired_secret_is_regenerated() {
		let (backend, id) = key_backend().await;
		let repo = Arc::new(SecretsRepository::new(create_test_pool().await));
		let store = Arc::new(SqliteSecretStore::new(repo.clone(), Duration::from_secs(60)).unwrap());
		let service = SecretVaultService::new(
			backend.clone(),
			store,
			Arc::new(MemoryRegistry::default()),
			id,
			"test-alias",
			Duration::from_secs(60),
		);
		service.register_app("payments", None).await.unwrap();

		let stale_at = Utc::now().trunc_subsecs(6) - chrono::Duration::seconds(120);
		let stale = backend.encrypt(&id, b"stale-secret").await.unwrap();
		repo.replace_envelope("payments", &stale, stale_at)
			.await
			.unwrap();

		let secret = service.get_secret("payments").await.unwrap();
		assert_ne!(secret.secret_value.expose(), "stale-secret");
		assert!(secret.created_at > stale_at);
	}

	#[tokio::test]
	async fn health_reports_unregistered_and_active() {
		let (service, _store) = service().await;
		assert_eq!(
			service.check_health("payments").await.unwrap(),
			SecretHealth::Unregistered
		);

		service.register_app("payments", None).await.unwrap();
		match service.check_health("payments").await.unwrap() {
			SecretHealth::Active {
				expires_in_seconds,
				is_expired,
				..
			} => {
				assert!(expires_in_seconds > 3590);
				assert!(!is_expired);
			}
			SecretHealth::Unregistered => panic!("expected active"),
		}
	}

	#[tokio::test]
	async fn find_key_falls_back_to_default_alias() {
		let (service, _store) = service().await;

		let default = service.find_key(None).await.unwrap();
		assert_eq!(default.key_alt_name, "test-alias");
		assert_eq!(default.key_id, service.active_key_id());
		assert_eq!(service.find_key(Some("  ")).await.unwrap(), default);
		assert!(matches!(
			service.find_key(Some("other")).await,
			Err(SecretsError::KeyNotFound(_))
		));
	}
}
