use anyhow::{Result, bail};
use std::fmt::{self, Display};

/// Compression byte of a PMTiles header, used for both directories/metadata
/// ("internal compression") and tile payloads.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TileCompression {
	Unknown = 0x0,
	None = 0x1,
	Gzip = 0x2,
	Brotli = 0x3,
	Zstd = 0x4,
}

impl TileCompression {
	pub fn from_u8(value: u8) -> Result<Self> {
		Ok(match value {
			0 => TileCompression::Unknown,
			1 => TileCompression::None,
			2 => TileCompression::Gzip,
			3 => TileCompression::Brotli,
			4 => TileCompression::Zstd,
			_ => bail!("unknown value {value} for PMTiles compression"),
		})
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			TileCompression::Unknown => "unknown",
			TileCompression::None => "none",
			TileCompression::Gzip => "gzip",
			TileCompression::Brotli => "brotli",
			TileCompression::Zstd => "zstd",
		}
	}
}

impl Display for TileCompression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
