//! In-memory fixtures for tests: an archive builder and a [`RangeSource`] over a
//! [`Blob`] whose content can be swapped to simulate an archive being replaced.

use crate::{ArchiveError, ArchiveResult, Directory, Entry, Header, RangeResponse, RangeSource};
use anyhow::{Result, ensure};
use async_trait::async_trait;
use parking_lot::Mutex;
use pmtiles_edge_core::{Blob, ByteRange, TileCompression, TileCoord, TileType, compression::compress};
use std::{
	collections::BTreeMap,
	sync::atomic::{AtomicUsize, Ordering},
};
use tokio_util::sync::CancellationToken;

/// Builds a valid PMTiles v3 archive: header, root directory, metadata, optional
/// leaf directories and tile data, in that order.
#[derive(Clone, Debug)]
pub struct ArchiveBuilder {
	tile_type: TileType,
	tile_compression: TileCompression,
	internal_compression: TileCompression,
	zoom_range: Option<(u8, u8)>,
	metadata: serde_json::Value,
	tiles: BTreeMap<u64, Blob>,
	leaf_size: Option<usize>,
}

impl ArchiveBuilder {
	pub fn new(tile_type: TileType) -> ArchiveBuilder {
		ArchiveBuilder {
			tile_type,
			tile_compression: TileCompression::None,
			internal_compression: TileCompression::Gzip,
			zoom_range: None,
			metadata: serde_json::json!({}),
			tiles: BTreeMap::new(),
			leaf_size: None,
		}
	}

	#[must_use]
	pub fn tile_compression(mut self, compression: TileCompression) -> Self {
		self.tile_compression = compression;
		self
	}

	#[must_use]
	pub fn internal_compression(mut self, compression: TileCompression) -> Self {
		self.internal_compression = compression;
		self
	}

	/// Overrides the zoom range otherwise derived from the added tiles.
	#[must_use]
	pub fn zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
		self.zoom_range = Some((min_zoom, max_zoom));
		self
	}

	#[must_use]
	pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = metadata;
		self
	}

	#[must_use]
	pub fn tile(mut self, coord: TileCoord, data: impl Into<Blob>) -> Self {
		self.tiles.insert(coord.tile_id(), data.into());
		self
	}

	/// Splits the tile entries into leaf directories of `leaf_size` entries each.
	#[must_use]
	pub fn leaf_size(mut self, leaf_size: usize) -> Self {
		self.leaf_size = Some(leaf_size.max(1));
		self
	}

	pub fn build(&self) -> Result<Blob> {
		ensure!(!self.tiles.is_empty(), "an archive needs at least one tile");

		let mut tile_data: Vec<u8> = Vec::new();
		let mut entries: Vec<Entry> = Vec::new();
		for (tile_id, blob) in &self.tiles {
			let blob = compress(blob, self.tile_compression)?;
			entries.push(Entry::new(*tile_id, ByteRange::new(tile_data.len() as u64, blob.len()), 1));
			tile_data.extend_from_slice(blob.as_slice());
		}

		let mut leaf_dirs: Vec<u8> = Vec::new();
		let root_entries = match self.leaf_size {
			None => entries.clone(),
			Some(leaf_size) => {
				let mut root_entries = Vec::new();
				for chunk in entries.chunks(leaf_size) {
					let leaf = self.compress_directory(chunk.to_vec())?;
					root_entries.push(Entry::new(
						chunk[0].tile_id,
						ByteRange::new(leaf_dirs.len() as u64, leaf.len()),
						0,
					));
					leaf_dirs.extend_from_slice(leaf.as_slice());
				}
				root_entries
			}
		};
		let root_dir = self.compress_directory(root_entries)?;
		let metadata = compress(&Blob::from(serde_json::to_vec(&self.metadata)?), self.internal_compression)?;

		let zooms = self
			.tiles
			.keys()
			.map(|id| TileCoord::from_tile_id(*id).map(|coord| coord.z))
			.collect::<Result<Vec<u8>>>()?;
		let (min_zoom, max_zoom) = self.zoom_range.unwrap_or_else(|| {
			(
				zooms.iter().copied().min().unwrap_or(0),
				zooms.iter().copied().max().unwrap_or(0),
			)
		});

		let root_range = ByteRange::new(Header::LEN, root_dir.len());
		let metadata_range = ByteRange::new(root_range.end(), metadata.len());
		let leaf_range = ByteRange::new(metadata_range.end(), leaf_dirs.len() as u64);
		let tile_range = ByteRange::new(leaf_range.end(), tile_data.len() as u64);

		let header = Header {
			root_dir: root_range,
			metadata: metadata_range,
			leaf_dirs: leaf_range,
			tile_data: tile_range,
			addressed_tiles_count: entries.len() as u64,
			tile_entries_count: entries.len() as u64,
			tile_contents_count: entries.len() as u64,
			clustered: true,
			internal_compression: self.internal_compression,
			tile_compression: self.tile_compression,
			tile_type: self.tile_type,
			min_zoom,
			max_zoom,
			min_lon_e7: -1_800_000_000,
			min_lat_e7: -850_000_000,
			max_lon_e7: 1_800_000_000,
			max_lat_e7: 850_000_000,
			center_zoom: min_zoom,
			center_lon_e7: 0,
			center_lat_e7: 0,
			etag: None,
		};

		let mut bytes = header.serialize()?.into_vec();
		bytes.extend_from_slice(root_dir.as_slice());
		bytes.extend_from_slice(metadata.as_slice());
		bytes.extend_from_slice(&leaf_dirs);
		bytes.extend_from_slice(&tile_data);
		Ok(Blob::from(bytes))
	}

	fn compress_directory(&self, entries: Vec<Entry>) -> Result<Blob> {
		compress(&Directory::new(entries).serialize()?, self.internal_compression)
	}
}

/// Serves an archive from memory. Every [`MemorySource::replace`] produces a new
/// etag, and reads pinned to an older etag fail with
/// [`ArchiveError::EtagMismatch`].
#[derive(Debug)]
pub struct MemorySource {
	key: String,
	state: Mutex<Option<(Blob, u64)>>,
	reads: AtomicUsize,
	cache_control: Option<String>,
}

impl MemorySource {
	pub fn new(key: &str, blob: Blob) -> MemorySource {
		MemorySource {
			key: key.to_string(),
			state: Mutex::new(Some((blob, 1))),
			reads: AtomicUsize::new(0),
			cache_control: None,
		}
	}

	/// A source whose archive does not exist.
	pub fn missing(key: &str) -> MemorySource {
		MemorySource {
			key: key.to_string(),
			state: Mutex::new(None),
			reads: AtomicUsize::new(0),
			cache_control: None,
		}
	}

	#[must_use]
	pub fn with_cache_control(mut self, cache_control: &str) -> Self {
		self.cache_control = Some(cache_control.to_string());
		self
	}

	pub fn replace(&self, blob: Blob) {
		let mut state = self.state.lock();
		let version = state.as_ref().map_or(1, |(_, version)| version + 1);
		*state = Some((blob, version));
	}

	pub fn read_count(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl RangeSource for MemorySource {
	fn key(&self) -> &str {
		&self.key
	}

	async fn get_bytes(
		&self,
		range: ByteRange,
		cancel: &CancellationToken,
		etag: Option<&str>,
	) -> ArchiveResult<RangeResponse> {
		if cancel.is_cancelled() {
			return Err(ArchiveError::Cancelled);
		}
		self.reads.fetch_add(1, Ordering::SeqCst);

		let state = self.state.lock();
		let Some((blob, version)) = state.as_ref() else {
			return Err(ArchiveError::KeyNotFound(self.key.clone()));
		};

		let current = format!("\"v{version}\"");
		if etag.is_some_and(|etag| etag != current) {
			return Err(ArchiveError::EtagMismatch);
		}

		Ok(RangeResponse {
			data: blob.read_range(&range.clamp_to(blob.len()))?,
			etag: Some(current),
			cache_control: self.cache_control.clone(),
			expires: None,
		})
	}
}
