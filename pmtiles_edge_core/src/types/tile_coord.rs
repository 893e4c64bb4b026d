//! Tile coordinates in the XYZ scheme and their PMTiles tile ids.
//!
//! PMTiles orders tiles along a Hilbert curve per zoom level. The tile id of a
//! coordinate is the number of tiles on all lower zoom levels plus the position
//! of the tile on the Hilbert curve of its own zoom level.

use anyhow::{Result, ensure};
use std::fmt;

/// Highest zoom level whose tile ids fit into 64 bits.
const MAX_ZOOM: u8 = 31;

/// A tile coordinate with zoom level `z`, column `x` and row `y`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct TileCoord {
	pub z: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Creates a coordinate, checking that `x` and `y` lie inside the zoom level.
	pub fn new(z: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(z <= MAX_ZOOM, "tile zoom {z} exceeds 64-bit limit");
		let n = 1u64 << z;
		ensure!(
			u64::from(x) < n && u64::from(y) < n,
			"tile x/y ({x}/{y}) outside zoom level {z} bounds"
		);
		Ok(TileCoord { z, x, y })
	}

	/// Converts signed request coordinates, as they come out of a URL.
	pub fn from_signed(z: i64, x: i64, y: i64) -> Result<TileCoord> {
		let z = u8::try_from(z).map_err(|_| anyhow::anyhow!("tile zoom {z} is out of range"))?;
		let x = u32::try_from(x).map_err(|_| anyhow::anyhow!("tile x {x} is out of range"))?;
		let y = u32::try_from(y).map_err(|_| anyhow::anyhow!("tile y {y} is out of range"))?;
		TileCoord::new(z, x, y)
	}

	/// Returns the PMTiles tile id of this coordinate.
	pub fn tile_id(&self) -> u64 {
		let mut acc: u64 = 0;
		for z in 0..u64::from(self.z) {
			acc += 1u64 << (z * 2);
		}

		let n = 1i64 << self.z;
		let mut tx = i64::from(self.x);
		let mut ty = i64::from(self.y);
		let mut d: i64 = 0;
		let mut s = n / 2;
		while s > 0 {
			let rx = i64::from((tx & s) > 0);
			let ry = i64::from((ty & s) > 0);
			d += s * s * ((3 * rx) ^ ry);
			rotate(s, &mut tx, &mut ty, rx, ry);
			s /= 2;
		}

		acc + d as u64
	}

	/// Inverse of [`TileCoord::tile_id`].
	#[cfg(any(test, feature = "test"))]
	pub fn from_tile_id(tile_id: u64) -> Result<TileCoord> {
		let mut acc: u64 = 0;
		for z in 0..=MAX_ZOOM {
			let num_tiles = 1u64 << (u64::from(z) * 2);
			if acc + num_tiles > tile_id {
				let n = 1i64 << z;
				let mut t = tile_id - acc;
				let mut tx: i64 = 0;
				let mut ty: i64 = 0;
				let mut s: i64 = 1;
				while s < n {
					let rx = ((t / 2) & 1) as i64;
					let ry = ((t ^ rx as u64) & 1) as i64;
					rotate(s, &mut tx, &mut ty, rx, ry);
					tx += s * rx;
					ty += s * ry;
					t /= 4;
					s *= 2;
				}
				return TileCoord::new(z, tx as u32, ty as u32);
			}
			acc += num_tiles;
		}
		anyhow::bail!("tile id {tile_id} exceeds 64-bit limit")
	}
}

fn rotate(s: i64, tx: &mut i64, ty: &mut i64, rx: i64, ry: i64) {
	if ry == 0 {
		if rx == 1 {
			*tx = s - 1 - *tx;
			*ty = s - 1 - *ty;
		}
		std::mem::swap(tx, ty);
	}
}

impl fmt::Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}/{}/{})", self.z, self.x, self.y)
	}
}

impl fmt::Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(0, 0, 0, 0)]
	#[case(1, 0, 0, 1)]
	#[case(1, 0, 1, 2)]
	#[case(1, 1, 1, 3)]
	#[case(1, 1, 0, 4)]
	#[case(2, 2, 2, 13)]
	#[case(3, 5, 3, 73)]
	#[case(3, 7, 7, 63)]
	#[case(31, 0, 0, 1_537_228_672_809_129_301)]
	#[case(31, (1 << 31) - 1, (1 << 31) - 1, 4_611_686_018_427_387_903)]
	fn tile_ids(#[case] z: u8, #[case] x: u32, #[case] y: u32, #[case] id: u64) {
		let coord = TileCoord::new(z, x, y).unwrap();
		assert_eq!(coord.tile_id(), id);
		assert_eq!(TileCoord::from_tile_id(id).unwrap(), coord);
	}

	#[test]
	fn every_tile_of_low_zooms_survives_the_round_trip() {
		for z in 0..6u8 {
			for x in 0..(1u32 << z) {
				for y in 0..(1u32 << z) {
					let coord = TileCoord::new(z, x, y).unwrap();
					assert_eq!(TileCoord::from_tile_id(coord.tile_id()).unwrap(), coord);
				}
			}
		}
	}

	#[test]
	fn rejects_coordinates_outside_the_zoom_level() {
		assert!(TileCoord::new(0, 1, 0).is_err());
		assert!(TileCoord::new(3, 0, 8).is_err());
		assert!(TileCoord::new(32, 0, 0).is_err());
	}

	#[test]
	fn from_signed() {
		assert_eq!(TileCoord::from_signed(2, 1, 3).unwrap(), TileCoord::new(2, 1, 3).unwrap());
		assert!(TileCoord::from_signed(-1, 0, 0).is_err());
		assert!(TileCoord::from_signed(2, -1, 0).is_err());
		assert!(TileCoord::from_signed(300, 0, 0).is_err());
	}

	#[test]
	fn formatting() {
		let coord = TileCoord::new(4, 5, 6).unwrap();
		assert_eq!(format!("{coord:?}"), "TileCoord(4/5/6)");
		assert_eq!(coord.to_string(), "4/5/6");
	}
}
