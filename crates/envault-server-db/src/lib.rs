// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # envault-server-db
//!
//! SQLite persistence for envault via sqlx.
//!
//! ## Repositories
//!
//! | Module | Store trait | Table(s) |
//! |--------|-------------|----------|
//! | [`key_vault`] | [`KeyVaultStore`] | `key_vault`, `key_alt_names` |
//! | [`secrets`] | [`SecretsStore`] | `secrets` |
//! | [`allowed_apps`] | [`AllowedAppStore`] | `allowed_apps` |
//!
//! Each `*Repository` holds a `SqlitePool` and implements its `*Store` trait
//! by delegating to inherent methods, so callers can depend on the trait and
//! tests can substitute fakes.
//!
//! ## Errors
//!
//! | Variant | When |
//! |---------|------|
//! | `Conflict` | Unique constraint violation (a key alias already claimed) |
//! | `Sqlx` | Anything the driver reports |
//! | `Internal` | Stored data that cannot be parsed back |
//!
//! Lookups where absence is normal return `Result<Option<T>>`.
//!
//! ## Schema
//!
//! [`run_migrations`] applies `migrations/*.sql`. Every statement is
//! idempotent.

pub mod allowed_apps;
mod error;
pub mod key_vault;
mod migrations;
pub mod pool;
pub mod secrets;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use allowed_apps::{AllowedAppRepository, AllowedAppRow, AllowedAppStore};
pub use error::{DbError, Result};
pub use key_vault::{CreateDataKeyParams, DataKeyRow, KeyVaultRepository, KeyVaultStore};
pub use migrations::run_migrations;
pub use pool::{create_pool, ping};
pub use secrets::{SecretEnvelopeRow, SecretsRepository, SecretsStore};
pub use sqlx::sqlite::SqlitePool;
