use crate::{
	ArchiveError, ArchiveResult, Header, RangeSource, ResolvedValueCache, TileJson,
	cache::read_consistent,
};
use anyhow::anyhow;
use log::debug;
use pmtiles_edge_core::{Blob, TileCoord};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// Leaf directories nest at most this deep below the root directory.
const MAX_DIRECTORY_DEPTH: usize = 3;

/// Decompressed tile bytes with the caching metadata of the archive object.
#[derive(Clone, Debug, PartialEq)]
pub struct TileData {
	pub data: Blob,
	pub cache_control: Option<String>,
	pub expires: Option<OffsetDateTime>,
}

/// One archive, read through a [`RangeSource`] and a shared [`ResolvedValueCache`].
///
/// Instances are cheap and meant to live for a single request; everything worth
/// keeping lives in the cache.
#[derive(Debug)]
pub struct PMTiles {
	source: Arc<dyn RangeSource>,
	cache: Arc<ResolvedValueCache>,
}

impl PMTiles {
	pub fn new(source: Arc<dyn RangeSource>, cache: Arc<ResolvedValueCache>) -> PMTiles {
		PMTiles { source, cache }
	}

	pub fn key(&self) -> &str {
		self.source.key()
	}

	pub async fn header(&self, cancel: &CancellationToken) -> ArchiveResult<Arc<Header>> {
		self.cache.get_header(self.source.as_ref(), cancel).await
	}

	pub async fn metadata(&self, cancel: &CancellationToken) -> ArchiveResult<Arc<serde_json::Value>> {
		match self.metadata_attempt(cancel).await {
			Err(ArchiveError::EtagMismatch) => {
				self.invalidate();
				self.metadata_attempt(cancel).await
			}
			result => result,
		}
	}

	async fn metadata_attempt(&self, cancel: &CancellationToken) -> ArchiveResult<Arc<serde_json::Value>> {
		let header = self.header(cancel).await?;
		self.cache.get_metadata(self.source.as_ref(), &header, cancel).await
	}

	/// Builds the TileJSON document. `base_url` is the public URL of the archive
	/// without trailing slash; tile URLs are `{base_url}/{z}/{x}/{y}.{ext}`.
	pub async fn tile_json(&self, base_url: &str, cancel: &CancellationToken) -> ArchiveResult<TileJson> {
		// metadata first: a changed archive is re-read there, and the header
		// below then comes from the same version
		let metadata = self.metadata(cancel).await?;
		let header = self.header(cancel).await?;

		let extension = header.tile_type.extension().map(|e| format!(".{e}")).unwrap_or_default();
		let field = |name: &str| metadata.get(name).cloned();

		Ok(TileJson {
			tilejson: "3.0.0",
			scheme: "xyz",
			tiles: vec![format!("{base_url}/{{z}}/{{x}}/{{y}}{extension}")],
			vector_layers: field("vector_layers"),
			attribution: field("attribution"),
			description: field("description"),
			name: field("name"),
			version: field("version"),
			bounds: header.bounds(),
			center: header.center(),
			minzoom: header.min_zoom,
			maxzoom: header.max_zoom,
		})
	}

	/// Returns the decompressed tile at `coord`, or `None` if the archive has no
	/// tile there.
	pub async fn get_tile(&self, coord: &TileCoord, cancel: &CancellationToken) -> ArchiveResult<Option<TileData>> {
		match self.get_tile_attempt(coord, cancel).await {
			Err(ArchiveError::EtagMismatch) => {
				self.invalidate();
				self.get_tile_attempt(coord, cancel).await
			}
			result => result,
		}
	}

	async fn get_tile_attempt(&self, coord: &TileCoord, cancel: &CancellationToken) -> ArchiveResult<Option<TileData>> {
		let source = self.source.as_ref();
		let header = self.header(cancel).await?;
		if !header.contains_zoom(i64::from(coord.z)) {
			return Ok(None);
		}

		let tile_id = coord.tile_id();
		let mut directory_range = header.root_dir;

		for _ in 0..=MAX_DIRECTORY_DEPTH {
			let directory = self.cache.get_directory(source, directory_range, &header, cancel).await?;
			let Some(entry) = directory.find_tile(tile_id) else {
				return Ok(None);
			};

			if entry.is_leaf_pointer() {
				directory_range = entry.range.get_shifted_forward(header.leaf_dirs.offset);
				continue;
			}

			let range = entry.range.get_shifted_forward(header.tile_data.offset);
			let response = read_consistent(source, range, &header, cancel).await?;

			let data = self.cache.decompressor().decompress(response.data, header.tile_compression)?;
			return Ok(Some(TileData {
				data,
				cache_control: response.cache_control,
				expires: response.expires,
			}));
		}

		Err(anyhow!("maximum directory depth exceeded in archive '{}'", self.key()).into())
	}

	fn invalidate(&self) {
		debug!("archive '{}' changed, dropping cached values and retrying", self.key());
		self.cache.invalidate(self.key());
	}
}
