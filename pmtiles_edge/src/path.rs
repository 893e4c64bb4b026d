//! Parses request paths into an archive name and an optional tile coordinate.
//!
//! Two shapes are understood:
//! - `/{name}.json` requests the TileJSON of archive `name` (no slash allowed in `name`),
//! - `/{name}/{z}/{x}/{y}.{ext}` requests one tile; `name` may contain slashes.
//!
//! ```rust
//! use pmtiles_edge::path::TilePath;
//!
//! let path = TilePath::parse("/planet/v3/4/8/5.mvt").unwrap();
//! assert_eq!(path.name, "planet/v3");
//! assert_eq!(path.tile, Some((4, 8, 5)));
//! assert_eq!(path.extension, "mvt");
//!
//! assert!(TilePath::parse("/planet/4/8").is_none());
//! ```

use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TilePath {
	/// Archive name, without leading slash.
	pub name: String,
	/// `(z, x, y)`; absent for TileJSON requests.
	pub tile: Option<(i64, i64, i64)>,
	pub extension: String,
}

impl TilePath {
	/// Returns `None` for every path that is neither a TileJSON nor a tile request.
	pub fn parse(path: &str) -> Option<TilePath> {
		let clean = path.strip_prefix('/').unwrap_or(path);
		if clean.is_empty() {
			return None;
		}

		if !clean.contains('/') {
			if let Some(name) = clean.strip_suffix(".json") {
				return Some(TilePath {
					name: name.to_string(),
					tile: None,
					extension: "json".to_string(),
				});
			}
		}

		let parts: Vec<&str> = clean.split('/').collect();
		if parts.len() < 4 {
			return None;
		}

		let &[z, x, y_ext] = &parts[parts.len() - 3..] else {
			return None;
		};
		let (y, extension) = y_ext.rsplit_once('.')?;
		if extension.is_empty() || !extension.bytes().all(|b| b.is_ascii_lowercase()) {
			return None;
		}

		let tile = (parse_integer(z)?, parse_integer(x)?, parse_integer(y)?);

		Some(TilePath {
			name: parts[..parts.len() - 3].join("/"),
			tile: Some(tile),
			extension: extension.to_string(),
		})
	}

	pub fn is_tilejson(&self) -> bool {
		self.tile.is_none()
	}
}

/// Base-10 integer with optional sign. Rejects empty strings, whitespace,
/// fractions and exponents.
fn parse_integer(text: &str) -> Option<i64> {
	let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	text.parse().ok()
}

impl fmt::Display for TilePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.tile {
			Some((z, x, y)) => write!(f, "{}/{z}/{x}/{y}.{}", self.name, self.extension),
			None => write!(f, "{}.{}", self.name, self.extension),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn tile(name: &str, z: i64, x: i64, y: i64, ext: &str) -> Option<TilePath> {
		Some(TilePath {
			name: name.to_string(),
			tile: Some((z, x, y)),
			extension: ext.to_string(),
		})
	}

	#[rstest]
	#[case("/osm/0/0/0.mvt", tile("osm", 0, 0, 0, "mvt"))]
	#[case("osm/12/2200/1343.png", tile("osm", 12, 2200, 1343, "png"))]
	#[case("/a/b/c/1/2/3.webp", tile("a/b/c", 1, 2, 3, "webp"))]
	#[case("/osm/-1/0/0.mvt", tile("osm", -1, 0, 0, "mvt"))]
	#[case("/osm/1/2/3.tar.pbf", None)]
	#[case("/osm/1/2/3.4.pbf", None)]
	#[case("//1/2/3.png", tile("", 1, 2, 3, "png"))]
	fn tile_paths(#[case] path: &str, #[case] expected: Option<TilePath>) {
		assert_eq!(TilePath::parse(path), expected);
	}

	#[test]
	fn tilejson_paths() {
		let path = TilePath::parse("/osm.json").unwrap();
		assert_eq!(path.name, "osm");
		assert_eq!(path.tile, None);
		assert_eq!(path.extension, "json");
		assert!(path.is_tilejson());

		assert_eq!(TilePath::parse("/.json").unwrap().name, "");
		assert_eq!(TilePath::parse("/osm/extra.json"), None);
	}

	#[rstest]
	#[case("")]
	#[case("/")]
	#[case("/osm")]
	#[case("/osm/1/2")]
	#[case("/1/2/3.png")]
	#[case("/osm/1/2/3")]
	#[case("/osm/1/2/3.")]
	#[case("/osm/1/2/3.PNG")]
	#[case("/osm/1/2/3.mv1")]
	#[case("/osm/a/2/3.png")]
	#[case("/osm/1/2.5/3.png")]
	#[case("/osm/1/2/1e3.png")]
	#[case("/osm//2/3.png")]
	#[case("/osm/1/2/.png")]
	#[case("/osm/1/ 2/3.png")]
	#[case("/osm/1/-/3.png")]
	fn invalid_paths(#[case] path: &str) {
		assert_eq!(TilePath::parse(path), None);
	}

	#[test]
	fn display() {
		assert_eq!(TilePath::parse("/a/b/1/2/3.png").unwrap().to_string(), "a/b/1/2/3.png");
		assert_eq!(TilePath::parse("/osm.json").unwrap().to_string(), "osm.json");
	}
}
