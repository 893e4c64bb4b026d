//! Read access to PMTiles v3 archives through an abstract byte-range source.
//!
//! The crate is built around three pieces:
//! - [`RangeSource`]: anything that can serve `(offset, length, etag)` reads,
//! - [`ResolvedValueCache`]: a shared, fixed-capacity cache of decoded headers,
//!   directories and metadata with a pluggable [`Decompressor`],
//! - [`PMTiles`]: the facade that resolves headers, TileJSON and tiles.
//!
//! A typical request opens a [`PMTiles`] over a fresh source, shares one
//! long-lived cache, and calls [`PMTiles::get_tile`] or [`PMTiles::tile_json`].
//!
//! # Features
//! - `test`: exposes [`testing`] with an archive builder and an in-memory source.

mod archive;
mod cache;
mod decompressor;
mod error;
mod source;
mod tilejson;
mod types;

#[cfg(any(test, feature = "test"))]
pub mod testing;

pub use archive::{PMTiles, TileData};
pub use cache::{DEFAULT_MAX_ENTRIES, HEADER_PREFETCH, ResolvedValueCache};
pub use decompressor::{DefaultDecompressor, Decompressor};
pub use error::{ArchiveError, ArchiveResult};
pub use source::{RangeResponse, RangeSource};
pub use tilejson::TileJson;
pub use types::{Directory, Entry, Header};
