//! Directories map tile ids to byte ranges, either of tile data or of a leaf
//! directory one level further down.

use anyhow::{Context, Result, bail, ensure};
#[cfg(any(test, feature = "test"))]
use pmtiles_edge_core::io::ValueWriterBlob;
use pmtiles_edge_core::{Blob, ByteRange, io::ValueReaderSlice};
use std::cmp::Ordering;

/// One directory entry. A `run_length` of zero marks a pointer to a leaf
/// directory; otherwise the entry covers `run_length` consecutive tile ids that
/// share the same tile data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
	pub tile_id: u64,
	pub range: ByteRange,
	pub run_length: u32,
}

impl Entry {
	pub fn new(tile_id: u64, range: ByteRange, run_length: u32) -> Entry {
		Entry {
			tile_id,
			range,
			run_length,
		}
	}

	pub fn is_leaf_pointer(&self) -> bool {
		self.run_length == 0
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Directory {
	entries: Vec<Entry>,
}

impl Directory {
	pub fn new(entries: Vec<Entry>) -> Directory {
		Directory { entries }
	}

	/// Decodes an uncompressed directory: entry count, then the columns tile id
	/// deltas, run lengths, lengths and offsets, all as varints.
	pub fn deserialize(data: &Blob) -> Result<Directory> {
		let mut reader = ValueReaderSlice::new(data.as_slice());

		let num_entries = reader.read_varint()?;
		ensure!(num_entries > 0, "empty directory is invalid");
		if num_entries > data.len() {
			bail!("directory claims {num_entries} entries but has only {} bytes", data.len());
		}
		let num_entries = num_entries as usize;

		let mut entries: Vec<Entry> = Vec::with_capacity(num_entries);
		let mut last_id: u64 = 0;
		for _ in 0..num_entries {
			last_id = last_id
				.checked_add(reader.read_varint()?)
				.context("tile id overflows in directory")?;
			entries.push(Entry::new(last_id, ByteRange::empty(), 0));
		}

		for entry in &mut entries {
			entry.run_length = u32::try_from(reader.read_varint()?)?;
		}

		for entry in &mut entries {
			entry.range.length = reader.read_varint()?;
		}

		for i in 0..num_entries {
			let value = reader.read_varint()?;
			entries[i].range.offset = if i > 0 && value == 0 {
				let previous = &entries[i - 1].range;
				previous
					.offset
					.checked_add(previous.length)
					.context("entry offset overflows in directory")?
			} else {
				value.checked_sub(1).context("first directory entry has no offset")?
			};
		}

		Ok(Directory { entries })
	}

	#[cfg(any(test, feature = "test"))]
	pub fn serialize(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new();
		writer.write_varint(self.entries.len() as u64)?;

		let mut last_id = 0;
		for entry in &self.entries {
			writer.write_varint(entry.tile_id - last_id)?;
			last_id = entry.tile_id;
		}

		for entry in &self.entries {
			writer.write_varint(u64::from(entry.run_length))?;
		}

		for entry in &self.entries {
			writer.write_varint(entry.range.length)?;
		}

		let mut previous: Option<&Entry> = None;
		for entry in &self.entries {
			match previous {
				Some(prev) if entry.range.offset == prev.range.end() => writer.write_varint(0)?,
				_ => writer.write_varint(entry.range.offset + 1)?,
			}
			previous = Some(entry);
		}

		Ok(writer.into_blob())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entries(&self) -> &[Entry] {
		&self.entries
	}

	/// Binary search for the entry responsible for `tile_id`: an exact match, the
	/// run that covers it, or the leaf pointer whose subtree may contain it.
	pub fn find_tile(&self, tile_id: u64) -> Option<Entry> {
		let mut m: i64 = 0;
		let mut n: i64 = self.entries.len() as i64 - 1;

		while m <= n {
			let k = (n + m) >> 1;
			match tile_id.cmp(&self.entries[k as usize].tile_id) {
				Ordering::Greater => m = k + 1,
				Ordering::Less => n = k - 1,
				Ordering::Equal => return Some(self.entries[k as usize]),
			}
		}

		// m > n
		if n >= 0 {
			let entry = self.entries[n as usize];
			if entry.is_leaf_pointer() || tile_id - entry.tile_id < u64::from(entry.run_length) {
				return Some(entry);
			}
		}

		None
	}
}
