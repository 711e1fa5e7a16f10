// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret store: one envelope per application, expiring after a fixed TTL.
//!
//! Expired envelopes are indistinguishable from missing ones. Reads only see
//! rows younger than the TTL; [`SqliteSecretStore::purge_expired`] removes
//! the rest physically.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envault_server_db::SecretsStore;

use crate::error::{SecretsError, SecretsResult};

/// A stored, still-encrypted secret.
#[derive(Debug, Clone)]
pub struct SecretEnvelope {
	pub app_id: String,
	pub ciphertext: Vec<u8>,
	pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SecretStore: Send + Sync {
	/// The live envelope for `app_id`, if any.
	async fn find(&self, app_id: &str) -> SecretsResult<Option<SecretEnvelope>>;

	/// Replace the envelope for `app_id` and restart its expiry clock at `now`.
	async fn upsert(&self, app_id: &str, ciphertext: &[u8], now: DateTime<Utc>)
		-> SecretsResult<()>;
}

pub struct SqliteSecretStore<S: SecretsStore> {
	repo: Arc<S>,
	ttl: chrono::Duration,
}

impl<S: SecretsStore> SqliteSecretStore<S> {
	pub fn new(repo: Arc<S>, ttl: Duration) -> SecretsResult<Self> {
		let ttl = chrono::Duration::from_std(ttl)
			.map_err(|e| SecretsError::Configuration(format!("secret ttl out of range: {e}")))?;
		Ok(Self { repo, ttl })
	}

	fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
		now - self.ttl
	}

	/// Delete envelopes older than the TTL. Returns how many were removed.
	#[tracing::instrument(skip(self))]
	pub async fn purge_expired(&self) -> SecretsResult<u64> {
		let removed = self.repo.delete_expired(self.cutoff(Utc::now())).await?;
		tracing::info!(removed, "expired secret envelopes purged");
		Ok(removed)
	}
}

#[async_trait]
impl<S: SecretsStore> SecretStore for SqliteSecretStore<S> {
	async fn find(&self, app_id: &str) -> SecretsResult<Option<SecretEnvelope>> {
		let row = self
			.repo
			.get_envelope(app_id, self.cutoff(Utc::now()))
			.await?;

		Ok(row.map(|r| SecretEnvelope {
			app_id: r.app_id,
			ciphertext: r.ciphertext,
			created_at: r.created_at,
		}))
	}

	async fn upsert(
		&self,
		app_id: &str,
		ciphertext: &[u8],
		now: DateTime<Utc>,
	) -> SecretsResult<()> {
		self.repo.replace_envelope(app_id, ciphertext, now).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use envault_server_db::testing::create_test_pool;
	use envault_server_db::SecretsRepository;

	async fn store(ttl_secs: u64) -> SqliteSecretStore<SecretsRepository> {
		let repo = Arc::new(SecretsRepository::new(create_test_pool().await));
		SqliteSecretStore::new(repo, Duration::from_secs(ttl_secs)).unwrap()
	}

	#[tokio::test]
	async fn upsert_then_find() {
		let store = store(3600).await;
		store.upsert("payments", b"v1", Utc::now()).await.unwrap();

		let found = store.find("payments").await.unwrap().unwrap();
		assert_eq!(found.app_id, "payments");
		assert_eq!(found.ciphertext, b"v1");
	}

	#[tokio::test]
	async fn upsert_replaces_wholesale() {
		let store = store(3600).await;
		store.upsert("payments", b"v1", Utc::now()).await.unwrap();
		store.upsert("payments", b"v2", Utc::now()).await.unwrap();

		assert_eq!(store.find("payments").await.unwrap().unwrap().ciphertext, b"v2");
	}

	#[tokio::test]
	async fn expired_envelope_is_invisible_and_purged() {
		let store = store(60).await;
		let stale = Utc::now() - chrono::Duration::seconds(120);
		store.upsert("payments", b"old", stale).await.unwrap();
		store.upsert("ledger", b"new", Utc::now()).await.unwrap();

		assert!(store.find("payments").await.unwrap().is_none());
		assert_eq!(store.purge_expired().await.unwrap(), 1);
		assert!(store.find("ledger").await.unwrap().is_some());
	}

	#[tokio::test]
	async fn upsert_restarts_expiry_clock() {
		let store = store(60).await;
		let stale = Utc::now() - chrono::Duration::seconds(120);
		store.upsert("payments", b"old", stale).await.unwrap();
		store.upsert("payments", b"fresh", Utc::now()).await.unwrap();

		assert_eq!(
			store.find("payments").await.unwrap().unwrap().ciphertext,
			b"fresh"
		);
	}
}
