// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wrapper type for everything envault must never print.
//!
//! Master key blobs, unwrapped data keys, generated application secrets and
//! the admin credential all travel inside [`Secret<T>`]. The wrapper:
//!
//! - formats as `[REDACTED]` through `Debug`, `Display` and `Serialize`
//! - zeroizes its contents when dropped
//! - has no `Deref`; callers reach the value through [`Secret::expose`]
//!
//! ```
//! use envault_common_secret::{Secret, SecretBytes};
//!
//! let admin_key = Secret::new("admin-key".to_string());
//! assert_eq!(format!("{admin_key}"), "[REDACTED]");
//! assert!(admin_key.matches("admin-key"));
//!
//! let dek: SecretBytes = Secret::new(vec![7u8; 64]);
//! assert_eq!(dek.expose().len(), 64);
//! ```

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Placeholder emitted in place of any wrapped value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that is redacted in every output path and wiped on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Secret text, such as an admin credential or a generated app secret.
pub type SecretString = Secret<String>;

/// Secret binary material, such as a master key or an unwrapped data key.
pub type SecretBytes = Secret<Vec<u8>>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the wrapped value. Every call site is an explicit disclosure.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Clone the wrapped value out. The original is still wiped on drop.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl<T> Secret<T>
where
	T: Zeroize + AsRef<[u8]>,
{
	/// Compare against a caller-supplied candidate in constant time.
	pub fn matches(&self, candidate: impl AsRef<[u8]>) -> bool {
		self.inner.as_ref().ct_eq(candidate.as_ref()).into()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + AsRef<[u8]>,
{
	fn eq(&self, other: &Self) -> bool {
		self.matches(other.inner.as_ref())
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + AsRef<[u8]> {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}
