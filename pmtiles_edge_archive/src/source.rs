//! The byte-range contract an archive is read through.

use crate::ArchiveResult;
use async_trait::async_trait;
use pmtiles_edge_core::{Blob, ByteRange};
use std::fmt::Debug;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// Bytes returned by a [`RangeSource`] together with the caching metadata of the
/// underlying object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeResponse {
	pub data: Blob,
	pub etag: Option<String>,
	pub cache_control: Option<String>,
	pub expires: Option<OffsetDateTime>,
}

impl RangeResponse {
	pub fn new(data: Blob, etag: Option<String>) -> RangeResponse {
		RangeResponse {
			data,
			etag,
			..Default::default()
		}
	}
}

/// Random access to the bytes of one archive.
///
/// Implementations must fail with [`ArchiveError::KeyNotFound`](crate::ArchiveError::KeyNotFound)
/// if the archive does not exist, with [`ArchiveError::EtagMismatch`](crate::ArchiveError::EtagMismatch)
/// if `etag` is given and no longer matches, and with
/// [`ArchiveError::Cancelled`](crate::ArchiveError::Cancelled) once `cancel` fires.
#[async_trait]
pub trait RangeSource: Debug + Send + Sync {
	/// Stable identity of the archive, used to keep cache entries of concurrently
	/// open archives apart.
	fn key(&self) -> &str;

	async fn get_bytes(
		&self,
		range: ByteRange,
		cancel: &CancellationToken,
		etag: Option<&str>,
	) -> ArchiveResult<RangeResponse>;
}
