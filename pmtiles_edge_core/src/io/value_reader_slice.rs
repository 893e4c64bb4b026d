//! This module provides the `ValueReaderSlice` struct for reading little-endian values and
//! varints from a byte slice.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_edge_core::io::ValueReaderSlice;
//!
//! let mut reader = ValueReaderSlice::new(&[0x01, 0x02, 0xAC, 0x02]);
//! assert_eq!(reader.read_u16().unwrap(), 0x0201);
//! assert_eq!(reader.read_varint().unwrap(), 300);
//! assert!(!reader.has_remaining());
//! ```

use anyhow::{Context, Result, bail, ensure};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

pub struct ValueReaderSlice<'a> {
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a> ValueReaderSlice<'a> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a> {
		ValueReaderSlice {
			cursor: Cursor::new(slice),
			len: slice.len() as u64,
		}
	}

	pub fn position(&self) -> u64 {
		self.cursor.position()
	}

	pub fn set_position(&mut self, position: u64) -> Result<()> {
		ensure!(position <= self.len, "set position outside length");
		self.cursor.set_position(position);
		Ok(())
	}

	pub fn has_remaining(&self) -> bool {
		self.cursor.position() < self.len
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		self.cursor.read_u8().context("failed to read u8")
	}

	pub fn read_u16(&mut self) -> Result<u16> {
		self.cursor.read_u16::<LittleEndian>().context("failed to read u16")
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		self.cursor.read_i32::<LittleEndian>().context("failed to read i32")
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		self.cursor.read_u64::<LittleEndian>().context("failed to read u64")
	}

	/// Reads an unsigned LEB128 varint.
	pub fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0;
		let mut shift = 0;
		loop {
			let byte = self.read_u8()?;
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("varint too long");
			}
		}
		Ok(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_fixed_width_values() {
		let data = [0xFF, 0x01, 0x00, 0x00, 0x80, 0x2A, 0, 0, 0, 0, 0, 0, 0];
		let mut reader = ValueReaderSlice::new(&data);
		assert_eq!(reader.read_u8().unwrap(), 255);
		assert_eq!(reader.read_i32().unwrap(), -2_147_483_647);
		assert_eq!(reader.read_u64().unwrap(), 42);
		assert!(!reader.has_remaining());
		assert!(reader.read_u8().is_err());
	}

	#[test]
	fn read_varints() {
		let mut reader = ValueReaderSlice::new(&[0x00, 0x7F, 0x80, 0x01, 0xE5, 0x8E, 0x26]);
		assert_eq!(reader.read_varint().unwrap(), 0);
		assert_eq!(reader.read_varint().unwrap(), 127);
		assert_eq!(reader.read_varint().unwrap(), 128);
		assert_eq!(reader.read_varint().unwrap(), 624_485);
	}

	#[test]
	fn varint_too_long() {
		let mut reader = ValueReaderSlice::new(&[0xFF; 11]);
		assert!(reader.read_varint().is_err());
	}

	#[test]
	fn positions() {
		let mut reader = ValueReaderSlice::new(&[1, 2, 3]);
		reader.set_position(2).unwrap();
		assert_eq!(reader.position(), 2);
		assert_eq!(reader.read_u8().unwrap(), 3);
		assert!(reader.set_position(4).is_err());
	}
}
