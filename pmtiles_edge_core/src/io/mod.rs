//! Little-endian value reading and writing for PMTiles headers and directories.

mod value_reader_slice;
#[cfg(any(test, feature = "test"))]
mod value_writer_blob;

pub use value_reader_slice::ValueReaderSlice;
#[cfg(any(test, feature = "test"))]
pub use value_writer_blob::ValueWriterBlob;
