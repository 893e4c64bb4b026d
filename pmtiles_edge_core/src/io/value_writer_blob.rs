//! Little-endian writer into an in-memory buffer, the counterpart of
//! [`ValueReaderSlice`](super::ValueReaderSlice).

use crate::Blob;
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

#[derive(Default)]
pub struct ValueWriterBlob {
	buffer: Vec<u8>,
}

impl ValueWriterBlob {
	#[must_use]
	pub fn new() -> ValueWriterBlob {
		ValueWriterBlob::default()
	}

	pub fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.buffer.write_u8(value)?)
	}

	pub fn write_i32(&mut self, value: i32) -> Result<()> {
		Ok(self.buffer.write_i32::<LittleEndian>(value)?)
	}

	pub fn write_u64(&mut self, value: u64) -> Result<()> {
		Ok(self.buffer.write_u64::<LittleEndian>(value)?)
	}

	pub fn write_varint(&mut self, mut value: u64) -> Result<()> {
		while value >= 0x80 {
			self.buffer.write_u8(((value & 0x7F) as u8) | 0x80)?;
			value >>= 7;
		}
		Ok(self.buffer.write_u8(value as u8)?)
	}

	pub fn write_slice(&mut self, slice: &[u8]) -> Result<()> {
		Ok(self.buffer.write_all(slice)?)
	}

	pub fn len(&self) -> u64 {
		self.buffer.len() as u64
	}

	pub fn is_empty(&self) -> bool {
		self.buffer.is_empty()
	}

	#[must_use]
	pub fn into_blob(self) -> Blob {
		Blob::from(self.buffer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::ValueReaderSlice;

	#[test]
	fn writes_what_the_reader_reads() {
		let mut writer = ValueWriterBlob::new();
		writer.write_slice(b"PM").unwrap();
		writer.write_u64(1 << 40).unwrap();
		writer.write_i32(-1_800_000_000).unwrap();
		writer.write_varint(624_485).unwrap();
		assert_eq!(writer.len(), 2 + 8 + 4 + 3);

		let blob = writer.into_blob();
		let mut reader = ValueReaderSlice::new(blob.as_slice());
		reader.set_position(2).unwrap();
		assert_eq!(reader.read_u64().unwrap(), 1 << 40);
		assert_eq!(reader.read_i32().unwrap(), -1_800_000_000);
		assert_eq!(reader.read_varint().unwrap(), 624_485);
	}
}
