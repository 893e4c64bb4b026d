//! Object storage the archives live in.
//!
//! A [`Bucket`] answers conditional range reads the way R2/S3-style stores do:
//! a missing key is `Ok(None)`, and an object whose etag precondition failed is
//! returned without a body. [`BucketSource`] adapts a bucket to the
//! [`RangeSource`](pmtiles_edge_archive::RangeSource) contract of the archive reader.

mod folder;
mod http;
mod memory;
mod source;

pub use folder::FolderBucket;
pub use http::HttpBucket;
pub use memory::MemoryBucket;
pub use source::{BucketSource, pmtiles_path};

use anyhow::Result;
use async_trait::async_trait;
use pmtiles_edge_core::{Blob, ByteRange};
use std::{fmt::Debug, path::Path, sync::Arc};
use time::OffsetDateTime;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetOptions {
	/// Bytes to return; the whole object if `None`. Ranges running past the end
	/// of the object are cut short.
	pub range: Option<ByteRange>,
	/// Only return the body if the object's etag equals this value.
	pub only_if_etag: Option<String>,
}

/// Caching metadata stored with an object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HttpMetadata {
	pub cache_control: Option<String>,
	pub cache_expiry: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectBody {
	pub etag: Option<String>,
	/// `None` if the etag precondition did not hold.
	pub body: Option<Blob>,
	pub http_metadata: HttpMetadata,
}

#[async_trait]
pub trait Bucket: Debug + Send + Sync {
	async fn get(&self, key: &str, options: &GetOptions) -> Result<Option<ObjectBody>>;
}

/// Opens the bucket a location string points to: `http://` and `https://` URLs
/// are served by [`HttpBucket`], `memory:` creates an empty [`MemoryBucket`],
/// everything else is a local folder.
pub fn bucket_from_location(location: &str) -> Result<Arc<dyn Bucket>> {
	Ok(if location.starts_with("http://") || location.starts_with("https://") {
		Arc::new(HttpBucket::new(location)?)
	} else if location == "memory:" {
		Arc::new(MemoryBucket::new())
	} else {
		Arc::new(FolderBucket::new(Path::new(location))?)
	})
}
