mod blob;
mod byte_range;
mod tile_compression;
mod tile_coord;
mod tile_type;

pub use blob::Blob;
pub use byte_range::ByteRange;
pub use tile_compression::TileCompression;
pub use tile_coord::TileCoord;
pub use tile_type::TileType;
