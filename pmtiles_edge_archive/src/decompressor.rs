use anyhow::Result;
use pmtiles_edge_core::{Blob, TileCompression, compression::decompress};
use std::fmt::Debug;

/// Strategy used by [`ResolvedValueCache`](crate::ResolvedValueCache) and
/// [`PMTiles`](crate::PMTiles) to unpack directories, metadata and tiles.
pub trait Decompressor: Debug + Send + Sync {
	fn decompress(&self, blob: Blob, compression: TileCompression) -> Result<Blob>;
}

/// Supports every compression a PMTiles v3 header can declare.
#[derive(Debug, Default)]
pub struct DefaultDecompressor;

impl Decompressor for DefaultDecompressor {
	fn decompress(&self, blob: Blob, compression: TileCompression) -> Result<Blob> {
		decompress(blob, compression)
	}
}
