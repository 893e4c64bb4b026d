//! This module provides the [`Blob`] struct, a cheaply clonable byte container used for
//! everything that travels between object storage, the archive decoder and HTTP responses.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_edge_core::{Blob, ByteRange};
//!
//! let blob = Blob::from("Hello, tiles!");
//! assert_eq!(blob.len(), 13);
//! assert_eq!(blob.read_range(&ByteRange::new(7, 5)).unwrap().as_str(), "tiles");
//! ```

use super::ByteRange;
use anyhow::{Result, ensure};
use bytes::Bytes;
use std::fmt::Debug;

/// Immutable byte data backed by [`Bytes`], so clones and sub-ranges never copy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Bytes);

impl Blob {
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Bytes::new())
	}

	/// Returns a new `Blob` sharing the bytes of `range`.
	///
	/// # Errors
	///
	/// Fails if the range is not fully contained in this blob.
	pub fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		let end = range.offset.checked_add(range.length);
		ensure!(
			end.is_some_and(|end| end <= self.0.len() as u64),
			"range {range} is outside of blob with length {}",
			self.0.len()
		);
		Ok(Blob(self.0.slice(range.as_range_usize())))
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	/// Interprets the bytes as UTF-8, replacing invalid sequences.
	#[must_use]
	pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.0)
	}

	#[must_use]
	pub fn into_bytes(self) -> Bytes {
		self.0
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0.to_vec()
	}

	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Bytes> for Blob {
	fn from(bytes: Bytes) -> Self {
		Blob(bytes)
	}
}

impl From<Vec<u8>> for Blob {
	fn from(vec: Vec<u8>) -> Self {
		Blob(Bytes::from(vec))
	}
}

impl From<&[u8]> for Blob {
	fn from(slice: &[u8]) -> Self {
		Blob(Bytes::copy_from_slice(slice))
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(array: &[u8; N]) -> Self {
		Blob(Bytes::copy_from_slice(array))
	}
}

impl From<&str> for Blob {
	fn from(text: &str) -> Self {
		Blob(Bytes::copy_from_slice(text.as_bytes()))
	}
}

impl From<String> for Blob {
	fn from(text: String) -> Self {
		Blob(Bytes::from(text))
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Blob({} bytes)", self.0.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_range_shares_bytes() {
		let blob = Blob::from(vec![0, 1, 2, 3, 4, 5, 6, 7]);
		let part = blob.read_range(&ByteRange::new(2, 3)).unwrap();
		assert_eq!(part.as_slice(), &[2, 3, 4]);
		assert_eq!(part.len(), 3);
	}

	#[test]
	fn read_range_outside_fails() {
		let blob = Blob::from(vec![0, 1, 2]);
		assert!(blob.read_range(&ByteRange::new(2, 2)).is_err());
		assert!(blob.read_range(&ByteRange::new(3, 0)).is_ok());
		assert!(blob.read_range(&ByteRange::new(u64::MAX, 2)).is_err());
	}

	#[test]
	fn conversions() {
		assert_eq!(Blob::from("abc").as_str(), "abc");
		assert_eq!(Blob::from(String::from("xyz")).into_vec(), b"xyz".to_vec());
		assert_eq!(Blob::from(&[1u8, 2]).into_bytes(), Bytes::from_static(&[1, 2]));
		assert!(Blob::new_empty().is_empty());
	}

	#[test]
	fn debug() {
		assert_eq!(format!("{:?}", Blob::from("hello")), "Blob(5 bytes)");
	}
}
