//! This module provides the `ByteRange` struct, which represents a range of bytes with an offset and length.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_edge_core::ByteRange;
//!
//! let range = ByteRange::new(23, 42);
//! assert_eq!(range.as_range_usize(), 23..65);
//! assert_eq!(range.to_string(), "[23,42]");
//! ```

use std::fmt;
use std::ops::Range;

/// A contiguous range of bytes, described by offset and length.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct ByteRange {
	pub offset: u64,
	pub length: u64,
}

impl ByteRange {
	#[must_use]
	pub fn new(offset: u64, length: u64) -> Self {
		Self { offset, length }
	}

	#[must_use]
	pub fn empty() -> Self {
		Self { offset: 0, length: 0 }
	}

	/// Returns a copy moved forward by `offset`, e.g. to turn a directory-relative
	/// tile position into an absolute file position.
	#[must_use]
	pub fn get_shifted_forward(&self, offset: u64) -> Self {
		Self {
			offset: self.offset + offset,
			length: self.length,
		}
	}

	/// Exclusive end position.
	#[must_use]
	pub fn end(&self) -> u64 {
		self.offset + self.length
	}

	/// Returns `true` if `other` lies completely inside this range.
	#[must_use]
	pub fn contains(&self, other: &ByteRange) -> bool {
		other.offset >= self.offset && other.end() <= self.end()
	}

	/// Cuts the range so that it does not run past `size`.
	#[must_use]
	pub fn clamp_to(&self, size: u64) -> Self {
		let offset = self.offset.min(size);
		Self {
			offset,
			length: self.length.min(size - offset),
		}
	}

	#[must_use]
	pub fn as_range_usize(&self) -> Range<usize> {
		Range {
			start: self.offset as usize,
			end: (self.offset + self.length) as usize,
		}
	}
}

impl fmt::Debug for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ByteRange[{},{}]", self.offset, self.length)
	}
}

impl fmt::Display for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{},{}]", self.offset, self.length)
	}
}
