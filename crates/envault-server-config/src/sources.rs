// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use envault_common_config::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AdminConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, VaultConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `ENVAULT_SERVER_CONFIG` if set, else `/etc/envault/server.toml`.
	pub fn system() -> Self {
		Self::new(env_var("ENVAULT_SERVER_CONFIG").unwrap_or_else(|| "/etc/envault/server.toml".into()))
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: ENVAULT_SERVER_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			vault: Some(load_vault_from_env()?),
			admin: Some(load_admin_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("'{v}': {e}"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("ENVAULT_SERVER_HOST"),
		port: env_parse("ENVAULT_SERVER_PORT")?,
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("ENVAULT_SERVER_DATABASE_URL"),
		max_connections: env_parse("ENVAULT_SERVER_DATABASE_MAX_CONNECTIONS")?,
	})
}

fn load_vault_from_env() -> Result<VaultConfigLayer, ConfigError> {
	Ok(VaultConfigLayer {
		kms_provider: env_parse("ENVAULT_SERVER_KMS_PROVIDER")?,
		master_key_path: env_var("ENVAULT_SERVER_MASTER_KEY_PATH").map(PathBuf::from),
		key_alias: env_var("ENVAULT_SERVER_KEY_ALIAS"),
		secret_ttl_secs: env_parse("ENVAULT_SERVER_SECRET_TTL_SECS")?,
	})
}

fn load_admin_from_env() -> Result<AdminConfigLayer, ConfigError> {
	Ok(AdminConfigLayer {
		api_key: load_secret_env("ENVAULT_SERVER_ADMIN_API_KEY")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("ENVAULT_SERVER_LOG_LEVEL"),
		format: env_parse("ENVAULT_SERVER_LOG_FORMAT")?,
	})
}
