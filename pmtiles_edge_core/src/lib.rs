//! Shared building blocks for the PMTiles edge server: byte containers, byte ranges,
//! tile coordinates with Hilbert tile ids, tile type and compression enums, a
//! little-endian value reader and the decompression functions.

pub mod compression;
pub mod io;
pub mod types;

pub use types::*;
