// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key management and secret lifecycle settings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

const DEFAULT_MASTER_KEY_PATH: &str = "./master-key.txt";
const DEFAULT_KEY_ALIAS: &str = "envault-data-key";
const DEFAULT_SECRET_TTL_SECS: u64 = 3600;

/// Where the master key comes from. Only a local key file is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KmsProvider {
	#[default]
	Local,
}

impl KmsProvider {
	pub fn as_str(&self) -> &'static str {
		match self {
			KmsProvider::Local => "local",
		}
	}
}

impl fmt::Display for KmsProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for KmsProvider {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"local" => Ok(KmsProvider::Local),
			other => Err(format!("unsupported kms provider '{other}'")),
		}
	}
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
	pub kms_provider: KmsProvider,
	pub master_key_path: PathBuf,
	pub key_alias: String,
	pub secret_ttl_secs: u64,
}

impl Default for VaultConfig {
	fn default() -> Self {
		VaultConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultConfigLayer {
	#[serde(default)]
	pub kms_provider: Option<KmsProvider>,
	#[serde(default)]
	pub master_key_path: Option<PathBuf>,
	#[serde(default)]
	pub key_alias: Option<String>,
	#[serde(default)]
	pub secret_ttl_secs: Option<u64>,
}

impl VaultConfigLayer {
	pub fn merge(&mut self, other: VaultConfigLayer) {
		if other.kms_provider.is_some() {
			self.kms_provider = other.kms_provider;
		}
		if other.master_key_path.is_some() {
			self.master_key_path = other.master_key_path;
		}
		if other.key_alias.is_some() {
			self.key_alias = other.key_alias;
		}
		if other.secret_ttl_secs.is_some() {
			self.secret_ttl_secs = other.secret_ttl_secs;
		}
	}

	pub fn finalize(self) -> VaultConfig {
		VaultConfig {
			kms_provider: self.kms_provider.unwrap_or_default(),
			master_key_path: self
				.master_key_path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_MASTER_KEY_PATH)),
			key_alias: self
				.key_alias
				.unwrap_or_else(|| DEFAULT_KEY_ALIAS.to_string()),
			secret_ttl_secs: self.secret_ttl_secs.unwrap_or(DEFAULT_SECRET_TTL_SECS),
		}
	}
}
