//! Decompression of archive payloads.
//!
//! PMTiles archives compress directories and metadata with their "internal
//! compression" and tiles with their "tile compression". [`decompress`] dispatches
//! on the header byte; unknown and uncompressed payloads pass through untouched.
//!
//! ```rust
//! use pmtiles_edge_core::{Blob, TileCompression, compression::decompress};
//!
//! let blob = Blob::from("plain");
//! assert_eq!(decompress(blob.clone(), TileCompression::None)?, blob);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::{Blob, TileCompression};
use anyhow::{Context, Result};
use std::io::Read;

pub fn decompress(blob: Blob, compression: TileCompression) -> Result<Blob> {
	match compression {
		TileCompression::Unknown | TileCompression::None => Ok(blob),
		TileCompression::Gzip => decompress_gzip(&blob),
		TileCompression::Brotli => decompress_brotli(&blob),
		TileCompression::Zstd => decompress_zstd(&blob),
	}
}

pub fn decompress_gzip(blob: &Blob) -> Result<Blob> {
	let mut decoder = flate2::bufread::GzDecoder::new(blob.as_slice());
	let mut data = Vec::new();
	decoder
		.read_to_end(&mut data)
		.with_context(|| format!("failed to decompress {} bytes using gzip", blob.len()))?;
	Ok(Blob::from(data))
}

pub fn decompress_brotli(blob: &Blob) -> Result<Blob> {
	let mut data = Vec::new();
	brotli::BrotliDecompress(&mut blob.as_slice(), &mut data)
		.with_context(|| format!("failed to decompress {} bytes using brotli", blob.len()))?;
	Ok(Blob::from(data))
}

pub fn decompress_zstd(blob: &Blob) -> Result<Blob> {
	let data = zstd::decode_all(blob.as_slice())
		.with_context(|| format!("failed to decompress {} bytes using zstd", blob.len()))?;
	Ok(Blob::from(data))
}

/// Compression is only needed to build fixture archives for tests.
#[cfg(any(test, feature = "test"))]
pub fn compress(blob: &Blob, compression: TileCompression) -> Result<Blob> {
	use std::io::Write;

	Ok(match compression {
		TileCompression::Unknown | TileCompression::None => blob.clone(),
		TileCompression::Gzip => {
			let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
			encoder.write_all(blob.as_slice())?;
			Blob::from(encoder.finish()?)
		}
		TileCompression::Brotli => {
			let mut data = Vec::new();
			let params = brotli::enc::BrotliEncoderParams::default();
			brotli::BrotliCompress(&mut blob.as_slice(), &mut data, &params)?;
			Blob::from(data)
		}
		TileCompression::Zstd => Blob::from(zstd::encode_all(blob.as_slice(), 3)?),
	})
}
