//! The payload type a PMTiles archive declares for all of its tiles.
//!
//! Each type maps to one canonical file extension and one MIME type. Vector
//! tiles additionally answer to the generic `pbf` extension.
//!
//! ```rust
//! use pmtiles_edge_core::TileType;
//!
//! assert_eq!(TileType::Mvt.extension(), Some("mvt"));
//! assert!(TileType::Mvt.accepts_extension("pbf"));
//! assert!(!TileType::Png.accepts_extension("jpg"));
//! ```

use anyhow::{Result, bail};
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TileType {
	Unknown = 0x0,
	Mvt = 0x1,
	Png = 0x2,
	Jpeg = 0x3,
	Webp = 0x4,
	Avif = 0x5,
}

impl TileType {
	pub fn from_u8(value: u8) -> Result<Self> {
		Ok(match value {
			0 => TileType::Unknown,
			1 => TileType::Mvt,
			2 => TileType::Png,
			3 => TileType::Jpeg,
			4 => TileType::Webp,
			5 => TileType::Avif,
			_ => bail!("unknown value {value} for PMTiles tile type"),
		})
	}

	/// Canonical extension without the leading dot; `None` for [`TileType::Unknown`].
	pub fn extension(&self) -> Option<&'static str> {
		match self {
			TileType::Unknown => None,
			TileType::Mvt => Some("mvt"),
			TileType::Png => Some("png"),
			TileType::Jpeg => Some("jpg"),
			TileType::Webp => Some("webp"),
			TileType::Avif => Some("avif"),
		}
	}

	/// MIME type used for `Content-Type`; `None` for [`TileType::Unknown`].
	pub fn mime(&self) -> Option<&'static str> {
		match self {
			TileType::Unknown => None,
			TileType::Mvt => Some("application/x-protobuf"),
			TileType::Png => Some("image/png"),
			TileType::Jpeg => Some("image/jpeg"),
			TileType::Webp => Some("image/webp"),
			TileType::Avif => Some("image/avif"),
		}
	}

	/// Returns `true` if a request with this extension may be served from an
	/// archive of this type. Archives of unknown type accept anything.
	pub fn accepts_extension(&self, extension: &str) -> bool {
		match self {
			TileType::Unknown => true,
			TileType::Mvt => extension == "mvt" || extension == "pbf",
			other => other.extension() == Some(extension),
		}
	}
}

impl Display for TileType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extension().unwrap_or("unknown"))
	}
}
