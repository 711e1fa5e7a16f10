// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the envault HTTP API.
//!
//! All bodies use camelCase field names and RFC 3339 timestamps.

pub mod admin;
pub mod error;
pub mod health;
pub mod secrets;

pub use admin::{AllowedAppResponse, KeyInfoResponse, KeyQuery, MessageResponse, RegisterAppRequest};
pub use error::{ErrorCode, ErrorResponse};
pub use health::{HealthResponse, HealthStatus};
pub use secrets::{SecretHealthResponse, SecretResponse, SecretStatus};
