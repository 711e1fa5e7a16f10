// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the envault crates.
//!
//! - [`Secret<T>`] re-exported from [`envault_common_secret`]
//! - [`load_secret_env`] for reading credentials from `VAR` or `VAR_FILE`

pub mod env;

pub use envault_common_secret::{Secret, SecretBytes, SecretString, REDACTED};

pub use env::{load_secret_env, SecretEnvError};
