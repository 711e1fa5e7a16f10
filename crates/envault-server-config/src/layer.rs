// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AdminConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, VaultConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub vault: Option<VaultConfigLayer>,
	#[serde(default)]
	pub admin: Option<AdminConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.vault, other.vault, VaultConfigLayer::merge);
		merge_option(&mut self.admin, other.admin, AdminConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn empty_other_keeps_base() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.http.as_ref().and_then(|h| h.port), Some(9000));
	}

	#[test]
	fn other_overrides_field_by_field() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				host: Some("127.0.0.1".to_string()),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(8443),
				..Default::default()
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.port, Some(8443));
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
	}

	#[test]
	fn parses_toml_sections() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[http]
			port = 9090

			[vault]
			kms_provider = "local"
			master_key_path = "/etc/envault/master.key"
			key_alias = "prod-key"
			secret_ttl_secs = 600

			[admin]
			api_key = "from-file"
			"#,
		)
		.unwrap();

		let vault = layer.vault.unwrap();
		assert_eq!(vault.key_alias.as_deref(), Some("prod-key"));
		assert_eq!(vault.secret_ttl_secs, Some(600));
		assert_eq!(
			layer.admin.unwrap().api_key.unwrap().expose(),
			"from-file"
		);
	}

	proptest! {
		#[test]
		fn later_ttl_always_wins(a in proptest::option::of(1u64..100_000), b in proptest::option::of(1u64..100_000)) {
			let mut base = ServerConfigLayer {
				vault: Some(VaultConfigLayer { secret_ttl_secs: a, ..Default::default() }),
				..Default::default()
			};
			base.merge(ServerConfigLayer {
				vault: Some(VaultConfigLayer { secret_ttl_secs: b, ..Default::default() }),
				..Default::default()
			});
			prop_assert_eq!(base.vault.unwrap().secret_ttl_secs, b.or(a));
		}
	}
}
