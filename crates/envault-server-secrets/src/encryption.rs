// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cryptographic primitives for the vault.
//!
//! - Data keys are wrapped under the key-encryption key with AES-256-GCM and
//!   a random nonce, with the key id bound as associated data.
//! - Secret payloads are sealed with AES-256-SIV, which is deterministic:
//!   the same data key and plaintext always produce the same envelope.
//!
//! Envelope layout: `version (1) || key_id (16) || siv_tag (16) || ciphertext`.
//! The version byte and key id are authenticated as associated data, so the
//! envelope names the key that opens it.

use aes_gcm::{
	aead::{Aead, KeyInit, Payload},
	Aes256Gcm, Key, Nonce,
};
use aes_siv::siv::Aes256Siv;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use envault_common_secret::SecretString;
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{SecretsError, SecretsResult};

/// Size of the key-encryption key (AES-256-GCM).
pub const KEK_SIZE: usize = 32;

/// Size of a data key. AES-SIV splits it into a MAC key and a CTR key.
pub const DATA_KEY_SIZE: usize = 64;

/// Size of the AES-GCM nonce prefixed to wrapped data keys.
pub const NONCE_SIZE: usize = 12;

/// Random bytes behind every generated application secret.
pub const SECRET_VALUE_BYTES: usize = 32;

pub const ENVELOPE_VERSION: u8 = 0x01;

const KEY_ID_SIZE: usize = 16;
const SIV_TAG_SIZE: usize = 16;
const ENVELOPE_HEADER_SIZE: usize = 1 + KEY_ID_SIZE;

/// Generate a fresh random data key.
pub fn generate_data_key() -> Zeroizing<[u8; DATA_KEY_SIZE]> {
	let mut key = Zeroizing::new([0u8; DATA_KEY_SIZE]);
	OsRng.fill_bytes(&mut key[..]);
	key
}

/// Generate a new application secret: 32 random bytes, base64 encoded.
pub fn generate_secret_value() -> SecretString {
	let mut raw = Zeroizing::new([0u8; SECRET_VALUE_BYTES]);
	OsRng.fill_bytes(&mut raw[..]);
	SecretString::new(BASE64.encode(&raw[..]))
}

/// Wrap a data key under the KEK. Output is `nonce || ciphertext`.
pub fn wrap_data_key(
	kek: &[u8; KEK_SIZE],
	key_id: &Uuid,
	dek: &[u8; DATA_KEY_SIZE],
) -> SecretsResult<Vec<u8>> {
	let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek));

	let mut nonce_bytes = [0u8; NONCE_SIZE];
	OsRng.fill_bytes(&mut nonce_bytes);

	let ciphertext = cipher
		.encrypt(
			Nonce::from_slice(&nonce_bytes),
			Payload {
				msg: dek.as_slice(),
				aad: key_id.as_bytes(),
			},
		)
		.map_err(|e| SecretsError::Encryption(format!("data key wrap failed: {e}")))?;

	let mut wrapped = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
	wrapped.extend_from_slice(&nonce_bytes);
	wrapped.extend_from_slice(&ciphertext);
	Ok(wrapped)
}

/// Unwrap a data key. Fails with `Decryption` if the KEK or key id differ
/// from the ones used to wrap it.
pub fn unwrap_data_key(
	kek: &[u8; KEK_SIZE],
	key_id: &Uuid,
	wrapped: &[u8],
) -> SecretsResult<Zeroizing<[u8; DATA_KEY_SIZE]>> {
	if wrapped.len() <= NONCE_SIZE {
		return Err(SecretsError::Decryption("wrapped data key too short".into()));
	}
	let (nonce, ciphertext) = wrapped.split_at(NONCE_SIZE);

	let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(kek));
	let plaintext = Zeroizing::new(
		cipher
			.decrypt(
				Nonce::from_slice(nonce),
				Payload {
					msg: ciphertext,
					aad: key_id.as_bytes(),
				},
			)
			.map_err(|e| SecretsError::Decryption(format!("data key unwrap failed: {e}")))?,
	);

	if plaintext.len() != DATA_KEY_SIZE {
		return Err(SecretsError::Decryption(format!(
			"unwrapped data key has {} bytes, expected {DATA_KEY_SIZE}",
			plaintext.len()
		)));
	}

	let mut dek = Zeroizing::new([0u8; DATA_KEY_SIZE]);
	dek.copy_from_slice(&plaintext);
	Ok(dek)
}

/// Seal `plaintext` under a data key into a self-describing envelope.
pub fn seal(dek: &[u8], key_id: &Uuid, plaintext: &[u8]) -> SecretsResult<Vec<u8>> {
	let mut cipher = siv_cipher(dek).map_err(SecretsError::Encryption)?;
	let header = envelope_header(key_id);

	let body = cipher
		.encrypt([&header[..]], plaintext)
		.map_err(|e| SecretsError::Encryption(format!("envelope seal failed: {e}")))?;

	let mut envelope = Vec::with_capacity(header.len() + body.len());
	envelope.extend_from_slice(&header);
	envelope.extend_from_slice(&body);
	Ok(envelope)
}

/// Read the key id out of an envelope without opening it.
pub fn envelope_key_id(envelope: &[u8]) -> SecretsResult<Uuid> {
	if envelope.len() < ENVELOPE_HEADER_SIZE + SIV_TAG_SIZE {
		return Err(SecretsError::Decryption("envelope too short".into()));
	}
	if envelope[0] != ENVELOPE_VERSION {
		return Err(SecretsError::Decryption(format!(
			"unsupported envelope version {:#04x}",
			envelope[0]
		)));
	}
	let mut id = [0u8; KEY_ID_SIZE];
	id.copy_from_slice(&envelope[1..ENVELOPE_HEADER_SIZE]);
	Ok(Uuid::from_bytes(id))
}

/// Open an envelope produced by [`seal`] with the matching data key.
pub fn open(dek: &[u8], envelope: &[u8]) -> SecretsResult<Zeroizing<Vec<u8>>> {
	envelope_key_id(envelope)?;
	let (header, body) = envelope.split_at(ENVELOPE_HEADER_SIZE);

	let mut cipher = siv_cipher(dek).map_err(SecretsError::Decryption)?;
	cipher
		.decrypt([header], body)
		.map(Zeroizing::new)
		.map_err(|_| SecretsError::Decryption("envelope authentication failed".into()))
}

fn envelope_header(key_id: &Uuid) -> [u8; ENVELOPE_HEADER_SIZE] {
	let mut header = [0u8; ENVELOPE_HEADER_SIZE];
	header[0] = ENVELOPE_VERSION;
	header[1..].copy_from_slice(key_id.as_bytes());
	header
}

fn siv_cipher(dek: &[u8]) -> Result<Aes256Siv, String> {
	use aes_siv::aead::KeyInit as _;
	Aes256Siv::new_from_slice(dek).map_err(|_| format!("data key must be {DATA_KEY_SIZE} bytes"))
}
