// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Master key provider for the local KMS.
//!
//! The master key is a 96-byte blob read once at startup. The key-encryption
//! key that wraps data keys is derived from it with HKDF-SHA256.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use envault_common_secret::SecretBytes;
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::encryption::KEK_SIZE;
use crate::error::{SecretsError, SecretsResult};

/// Length of the local master key blob.
pub const MASTER_KEY_SIZE: usize = 96;

const KEK_INFO: &[u8] = b"envault/local-kms/kek/v1";

/// Root key material. Immutable for the lifetime of the process.
#[derive(Debug)]
pub struct MasterKey {
	material: SecretBytes,
}

impl MasterKey {
	/// Read the master key from `path`.
	///
	/// Bytes past the first 96 are ignored, so a file with a trailing newline
	/// still loads.
	pub fn load(path: impl AsRef<Path>) -> SecretsResult<Self> {
		let path = path.as_ref();
		let bytes = Zeroizing::new(std::fs::read(path).map_err(|e| {
			SecretsError::Configuration(format!(
				"failed to read master key {}: {e}",
				path.display()
			))
		})?);

		if bytes.len() < MASTER_KEY_SIZE {
			return Err(SecretsError::Configuration(format!(
				"master key {} has {} bytes, need at least {MASTER_KEY_SIZE}",
				path.display(),
				bytes.len()
			)));
		}

		tracing::info!(path = %path.display(), "master key loaded");
		Ok(Self::from_bytes(&bytes[..MASTER_KEY_SIZE]))
	}

	/// Generate fresh random key material.
	pub fn generate() -> Self {
		let mut material = vec![0u8; MASTER_KEY_SIZE];
		OsRng.fill_bytes(&mut material);
		Self {
			material: SecretBytes::new(material),
		}
	}

	/// Write a freshly generated master key to `path`. Refuses to replace an
	/// existing file.
	pub fn write_new(path: impl AsRef<Path>) -> SecretsResult<Self> {
		let path = path.as_ref();
		let key = Self::generate();

		let mut options = OpenOptions::new();
		options.write(true).create_new(true);
		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.mode(0o600);
		}

		let mut file = options.open(path).map_err(|e| {
			SecretsError::Configuration(format!(
				"cannot create master key {}: {e}",
				path.display()
			))
		})?;
		file
			.write_all(key.material.expose())
			.and_then(|_| file.sync_all())
			.map_err(|e| {
				SecretsError::Configuration(format!(
					"failed to write master key {}: {e}",
					path.display()
				))
			})?;

		Ok(key)
	}

	fn from_bytes(bytes: &[u8]) -> Self {
		Self {
			material: SecretBytes::new(bytes.to_vec()),
		}
	}

	/// Derive the key-encryption key.
	pub fn derive_kek(&self) -> SecretsResult<Zeroizing<[u8; KEK_SIZE]>> {
		let hk = Hkdf::<Sha256>::new(None, self.material.expose());
		let mut kek = Zeroizing::new([0u8; KEK_SIZE]);
		hk.expand(KEK_INFO, &mut kek[..])
			.map_err(|e| SecretsError::Internal(format!("kek derivation failed: {e}")))?;
		Ok(kek)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_file_is_configuration_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = MasterKey::load(dir.path().join("absent")).unwrap_err();
		assert!(matches!(err, SecretsError::Configuration(_)));
	}

	#[test]
	fn short_file_is_configuration_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("short");
		std::fs::write(&path, [1u8; MASTER_KEY_SIZE - 1]).unwrap();

		assert!(matches!(
			MasterKey::load(&path),
			Err(SecretsError::Configuration(_))
		));
	}

	#[test]
	fn trailing_bytes_are_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let exact = dir.path().join("exact");
		let longer = dir.path().join("longer");
		std::fs::write(&exact, [3u8; MASTER_KEY_SIZE]).unwrap();
		let mut with_newline = vec![3u8; MASTER_KEY_SIZE];
		with_newline.push(b'\n');
		std::fs::write(&longer, with_newline).unwrap();

		let a = MasterKey::load(&exact).unwrap().derive_kek().unwrap();
		let b = MasterKey::load(&longer).unwrap().derive_kek().unwrap();
		assert_eq!(*a, *b);
	}

	#[test]
	fn write_new_refuses_to_overwrite() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("master-key.txt");

		let written = MasterKey::write_new(&path).unwrap();
		assert_eq!(std::fs::read(&path).unwrap().len(), MASTER_KEY_SIZE);
		assert!(matches!(
			MasterKey::write_new(&path),
			Err(SecretsError::Configuration(_))
		));

		let loaded = MasterKey::load(&path).unwrap();
		assert_eq!(*written.derive_kek().unwrap(), *loaded.derive_kek().unwrap());
	}

	#[test]
	fn distinct_keys_derive_distinct_keks() {
		let a = MasterKey::generate().derive_kek().unwrap();
		let b = MasterKey::generate().derive_kek().unwrap();
		assert_ne!(*a, *b);
	}

	#[test]
	fn debug_does_not_leak_material() {
		let key = MasterKey::generate();
		assert!(format!("{key:?}").contains("[REDACTED]"));
	}
}
