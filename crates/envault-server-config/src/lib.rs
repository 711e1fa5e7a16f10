// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for envault-server.
//!
//! Settings are layered from built-in defaults, a TOML file and
//! `ENVAULT_SERVER_*` environment variables, in increasing precedence.
//!
//! ```ignore
//! use envault_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub vault: VaultConfig,
	pub admin: AdminConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from defaults, the system TOML file and the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with an explicit config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Resolve a merged layer and validate it.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let vault = layer.vault.unwrap_or_default().finalize();
	let admin = layer.admin.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&database, &vault)?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		kms_provider = %vault.kms_provider,
		key_alias = %vault.key_alias,
		secret_ttl_secs = vault.secret_ttl_secs,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		vault,
		admin,
		logging,
	})
}

fn validate_config(database: &DatabaseConfig, vault: &VaultConfig) -> Result<(), ConfigError> {
	if database.max_connections == 0 {
		return Err(ConfigError::Validation(
			"database max_connections must be at least 1".to_string(),
		));
	}
	if vault.key_alias.trim().is_empty() {
		return Err(ConfigError::Validation("vault key_alias must not be empty".to_string()));
	}
	if vault.secret_ttl_secs == 0 {
		return Err(ConfigError::Validation(
			"vault secret_ttl_secs must be greater than zero".to_string(),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use envault_common_config::Secret;
	use std::io::Write;

	fn layer_with_admin() -> ServerConfigLayer {
		ServerConfigLayer {
			admin: Some(AdminConfigLayer {
				api_key: Some(Secret::new("admin".to_string())),
			}),
			..Default::default()
		}
	}

	#[test]
	fn finalize_applies_defaults() {
		let config = finalize(layer_with_admin()).unwrap();
		assert_eq!(config.socket_addr(), "0.0.0.0:8080");
		assert_eq!(config.vault.secret_ttl_secs, 3600);
		assert_eq!(config.admin.api_key.expose(), "admin");
	}

	#[test]
	fn finalize_requires_admin_key() {
		let err = finalize(ServerConfigLayer::default()).unwrap_err();
		assert!(matches!(err, ConfigError::MissingRequired(_)));
	}

	#[test]
	fn zero_ttl_is_rejected() {
		let mut layer = layer_with_admin();
		layer.vault = Some(VaultConfigLayer {
			secret_ttl_secs: Some(0),
			..Default::default()
		});
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn blank_alias_is_rejected() {
		let mut layer = layer_with_admin();
		layer.vault = Some(VaultConfigLayer {
			key_alias: Some("  ".to_string()),
			..Default::default()
		});
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn zero_connections_is_rejected() {
		let mut layer = layer_with_admin();
		layer.database = Some(DatabaseConfigLayer {
			max_connections: Some(0),
			..Default::default()
		});
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn unknown_kms_provider_in_toml_fails_to_parse() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[vault]\nkms_provider = \"aws\"").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}
}
