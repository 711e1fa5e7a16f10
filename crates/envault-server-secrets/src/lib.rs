// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # envault-server-secrets
//!
//! The secret vault engine: issues, stores and rotates one secret per
//! registered application, encrypted at rest.
//!
//! ## Envelope encryption
//!
//! ```text
//! master key (96 bytes, file)
//!     └── HKDF-SHA256 ──► KEK (AES-256-GCM)
//!                            └── wraps ──► data key (AES-256-SIV, stored wrapped)
//!                                             └── seals ──► secret envelope
//! ```
//!
//! Secret envelopes are deterministic: the same data key and plaintext give
//! the same ciphertext. Equal secrets are therefore visible as equal
//! envelopes to anyone with database access.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`master_key`] | Loads the root key material |
//! | [`key_backend`] | Data key lifecycle and the envelope cipher |
//! | [`store`] | One envelope per app, TTL filtered |
//! | [`registry`] | Allow-list of app identities |
//! | [`service`] | Gate, read, regenerate, rotate |
//! | [`context`] | Startup wiring and teardown |

pub mod context;
pub mod encryption;
pub mod error;
pub mod key_backend;
pub mod master_key;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;

pub use context::{purge_expired, DefaultVaultService, VaultContext};
pub use error::{SecretsError, SecretsResult};
pub use key_backend::{KeyBackend, LocalKeyBackend};
pub use master_key::{MasterKey, MASTER_KEY_SIZE};
pub use registry::{AccessRegistry, SqliteAccessRegistry};
pub use service::SecretVaultService;
pub use store::{SecretEnvelope, SecretStore, SqliteSecretStore};
pub use types::{AllowedApp, AppSecret, DataKeyId, KeyInfo, KeyStatus, SecretHealth};
