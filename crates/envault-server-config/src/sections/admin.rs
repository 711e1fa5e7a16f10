// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Administrative API credential.

use envault_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct AdminConfig {
	pub api_key: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfigLayer {
	#[serde(default)]
	pub api_key: Option<SecretString>,
}

impl AdminConfigLayer {
	pub fn merge(&mut self, other: AdminConfigLayer) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
	}

	pub fn finalize(self) -> Result<AdminConfig, ConfigError> {
		let api_key = self
			.api_key
			.filter(|k| !k.expose().trim().is_empty())
			.ok_or_else(|| ConfigError::MissingRequired("ENVAULT_SERVER_ADMIN_API_KEY".to_string()))?;

		Ok(AdminConfig { api_key })
	}
}
