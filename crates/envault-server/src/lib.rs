// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! envault HTTP server.
//!
//! Exposes the secret vault over HTTP: per-application secret reads and
//! rotations gated by the app registry, and an administrative surface
//! guarded by a shared admin key.

pub mod admin_auth;
pub mod api;
pub mod api_docs;
pub mod error;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use envault_server_config::ServerConfig;
pub use error::ServerError;
