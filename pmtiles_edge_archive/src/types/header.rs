use anyhow::{Result, ensure};
#[cfg(any(test, feature = "test"))]
use pmtiles_edge_core::io::ValueWriterBlob;
use pmtiles_edge_core::{Blob, ByteRange, TileCompression, TileType, io::ValueReaderSlice};

/// The fixed 127-byte header at the start of every PMTiles v3 archive, plus the
/// etag of the object it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
	pub root_dir: ByteRange,
	pub metadata: ByteRange,
	pub leaf_dirs: ByteRange,
	pub tile_data: ByteRange,
	pub addressed_tiles_count: u64,
	pub tile_entries_count: u64,
	pub tile_contents_count: u64,
	pub clustered: bool,
	pub internal_compression: TileCompression,
	pub tile_compression: TileCompression,
	pub tile_type: TileType,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub min_lon_e7: i32,
	pub min_lat_e7: i32,
	pub max_lon_e7: i32,
	pub max_lat_e7: i32,
	pub center_zoom: u8,
	pub center_lon_e7: i32,
	pub center_lat_e7: i32,
	/// Identity of the archive version all following reads must match.
	pub etag: Option<String>,
}

impl Header {
	pub const LEN: u64 = 127;

	/// Parses the header from the first bytes of an archive. `blob` may be longer
	/// than the header itself.
	pub fn deserialize(blob: &Blob, etag: Option<String>) -> Result<Header> {
		let buffer = blob.as_slice();

		ensure!(buffer.len() >= Self::LEN as usize, "pmtiles header too short: {} bytes", buffer.len());
		ensure!(&buffer[0..7] == b"PMTiles", "pmtiles magic number exception");
		ensure!(
			buffer[7] == 3,
			"archive is pmtiles version {}, but only version 3 is supported",
			buffer[7]
		);

		let mut reader = ValueReaderSlice::new(&buffer[..Self::LEN as usize]);
		reader.set_position(8)?;

		Ok(Header {
			root_dir: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			metadata: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			leaf_dirs: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			tile_data: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			addressed_tiles_count: reader.read_u64()?,
			tile_entries_count: reader.read_u64()?,
			tile_contents_count: reader.read_u64()?,
			clustered: reader.read_u8()? == 1,
			internal_compression: TileCompression::from_u8(reader.read_u8()?)?,
			tile_compression: TileCompression::from_u8(reader.read_u8()?)?,
			tile_type: TileType::from_u8(reader.read_u8()?)?,
			min_zoom: reader.read_u8()?,
			max_zoom: reader.read_u8()?,
			min_lon_e7: reader.read_i32()?,
			min_lat_e7: reader.read_i32()?,
			max_lon_e7: reader.read_i32()?,
			max_lat_e7: reader.read_i32()?,
			center_zoom: reader.read_u8()?,
			center_lon_e7: reader.read_i32()?,
			center_lat_e7: reader.read_i32()?,
			etag,
		})
	}

	/// Only fixture archives are ever written.
	#[cfg(any(test, feature = "test"))]
	pub fn serialize(&self) -> Result<Blob> {
		let mut writer = ValueWriterBlob::new();
		writer.write_slice(b"PMTiles")?;
		writer.write_u8(3)?;

		for range in [&self.root_dir, &self.metadata, &self.leaf_dirs, &self.tile_data] {
			writer.write_u64(range.offset)?;
			writer.write_u64(range.length)?;
		}
		writer.write_u64(self.addressed_tiles_count)?;
		writer.write_u64(self.tile_entries_count)?;
		writer.write_u64(self.tile_contents_count)?;

		writer.write_u8(u8::from(self.clustered))?;
		writer.write_u8(self.internal_compression as u8)?;
		writer.write_u8(self.tile_compression as u8)?;
		writer.write_u8(self.tile_type as u8)?;
		writer.write_u8(self.min_zoom)?;
		writer.write_u8(self.max_zoom)?;
		writer.write_i32(self.min_lon_e7)?;
		writer.write_i32(self.min_lat_e7)?;
		writer.write_i32(self.max_lon_e7)?;
		writer.write_i32(self.max_lat_e7)?;
		writer.write_u8(self.center_zoom)?;
		writer.write_i32(self.center_lon_e7)?;
		writer.write_i32(self.center_lat_e7)?;

		Ok(writer.into_blob())
	}

	/// `[min_lon, min_lat, max_lon, max_lat]` in degrees.
	pub fn bounds(&self) -> [f64; 4] {
		[
			e7_to_degrees(self.min_lon_e7),
			e7_to_degrees(self.min_lat_e7),
			e7_to_degrees(self.max_lon_e7),
			e7_to_degrees(self.max_lat_e7),
		]
	}

	/// `(lon, lat, zoom)` of the suggested initial view.
	pub fn center(&self) -> (f64, f64, u8) {
		(
			e7_to_degrees(self.center_lon_e7),
			e7_to_degrees(self.center_lat_e7),
			self.center_zoom,
		)
	}

	pub fn contains_zoom(&self, z: i64) -> bool {
		z >= i64::from(self.min_zoom) && z <= i64::from(self.max_zoom)
	}
}

fn e7_to_degrees(value: i32) -> f64 {
	f64::from(value) / 10_000_000.0
}
