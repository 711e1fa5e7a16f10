// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for envault-server.

pub mod admin;
pub mod database;
pub mod http;
pub mod logging;
pub mod vault;

pub use admin::{AdminConfig, AdminConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use vault::{KmsProvider, VaultConfig, VaultConfigLayer};
